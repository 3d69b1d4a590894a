use std::sync::atomic::{AtomicBool, Ordering};

use super::hasher::sha256_hex;

/// Number of leading hex zeros a valid proof hash must have
pub const DIFFICULTY: usize = 4;

/// How many candidates are tried between cancellation checks
const CANCEL_CHECK_INTERVAL: u64 = 1 << 12;

/// Validates a proof
///
/// Hashes the decimal forms of `last_proof` and `proof` concatenated with no
/// separator and checks the digest for `DIFFICULTY` leading zeros.
///
/// # Arguments
///
/// * `last_proof` - The proof of the previous block
/// * `proof` - The candidate proof
///
/// # Returns
///
/// true if the proof is valid, false otherwise
pub fn valid_proof(last_proof: u64, proof: u64) -> bool {
    let guess = format!("{}{}", last_proof, proof);
    let hash = sha256_hex(guess.as_bytes());

    hash.bytes().take(DIFFICULTY).all(|b| b == b'0')
}

/// Searches for the first proof, counting up from 0, that is valid against
/// `last_proof`
///
/// This is unbounded. Use `proof_of_work_cancellable` when the caller
/// needs to stop the search.
pub fn proof_of_work(last_proof: u64) -> u64 {
    let mut proof = 0;

    while !valid_proof(last_proof, proof) {
        proof += 1;
    }

    proof
}

/// Same search as `proof_of_work`, giving up once `cancel` is set
///
/// # Returns
///
/// The proof, or None if the search was cancelled first
pub fn proof_of_work_cancellable(last_proof: u64, cancel: &AtomicBool) -> Option<u64> {
    let mut proof = 0;

    loop {
        if proof % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            return None;
        }

        if valid_proof(last_proof, proof) {
            return Some(proof);
        }

        proof += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_valid_proof() {
        // sha256("10035293") = 0000c415de5c...
        assert!(valid_proof(100, 35293));
        assert!(valid_proof(1, 72608));
    }

    #[test]
    fn test_known_invalid_proof() {
        // sha256("1000") = 40510175...
        assert!(!valid_proof(100, 0));
        assert!(!valid_proof(100, 35292));
    }

    #[test]
    fn test_concatenation_has_no_separator() {
        // "100" + "35293" and "1003" + "5293" hash the same string
        assert!(valid_proof(1003, 5293));
    }

    #[test]
    fn test_proof_of_work_finds_first_valid_proof() {
        let proof = proof_of_work(100);

        assert_eq!(proof, 35293);
        assert!(valid_proof(100, proof));
        assert!((0..proof).all(|candidate| !valid_proof(100, candidate)));
    }

    #[test]
    fn test_proof_of_work_chains() {
        let next = proof_of_work(35293);

        assert_eq!(next, 35089);
        assert!(valid_proof(35293, next));
    }

    #[test]
    fn test_cancellable_search_matches_unbounded_search() {
        let cancel = AtomicBool::new(false);

        assert_eq!(proof_of_work_cancellable(0, &cancel), Some(69732));
    }

    #[test]
    fn test_cancelled_search_stops() {
        let cancel = AtomicBool::new(true);

        assert_eq!(proof_of_work_cancellable(100, &cancel), None);
    }
}
