//! Revert-reason decoding for disbursement failures
//!
//! The lending contract rejects with short condition strings; these map
//! to user-facing messages. Unknown reverts pass through verbatim so
//! nothing is hidden from the caller.

/// Known contract conditions and their user-facing messages.
const KNOWN_REASONS: [(&str, &str); 7] = [
    (
        "No credit score on file",
        "No credit score found on-chain. Please run credit scoring first.",
    ),
    (
        "Credit risk too high",
        "Your credit risk score exceeds the acceptable threshold for borrowing.",
    ),
    (
        "Exceeds max borrow limit",
        "Requested amount exceeds your maximum borrowing limit.",
    ),
    (
        "Already has active loan",
        "You already have an active loan. Repay it before borrowing again.",
    ),
    (
        "Lending pool insufficient",
        "The lending pool does not have enough liquidity for this loan.",
    ),
    (
        "Not authorized",
        "The agent is not authorized to disburse loans.",
    ),
    (
        "Transfer failed",
        "Token transfer failed during disbursement.",
    ),
];

/// Map a raw revert reason to a user-facing message.
pub fn decode(raw: &str) -> String {
    // Node clients wrap the reason as "execution reverted: <reason>"
    let reason = raw
        .split("execution reverted:")
        .last()
        .unwrap_or(raw)
        .trim()
        .trim_matches(|c| c == '\'' || c == '"');

    for (condition, friendly) in KNOWN_REASONS {
        if reason.contains(condition) {
            return friendly.to_string();
        }
    }
    format!("Contract rejected the transaction: {reason}")
}
