//! OS-entropy randomness source
//!
//! Stand-in for the verifiable on-chain randomness collaborator. Draws
//! are not protocol-verifiable, so `is_secure` is reported false.

use async_trait::async_trait;
use rand::Rng;

use emberlend_common::Result;

use crate::clients::{RandomDraw, RandomnessSource};

#[derive(Default)]
pub struct OsRandomness;

#[async_trait]
impl RandomnessSource for OsRandomness {
    async fn get_random(&self) -> Result<RandomDraw> {
        Ok(RandomDraw {
            value: rand::thread_rng().gen::<u128>(),
            is_secure: false,
        })
    }
}
