//! Time plus random identifiers

use chrono::Utc;
use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn random_suffix(len: usize) -> String {
	let mut rng = rand::thread_rng();
	(0..len)
		.map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
		.collect()
}

/// Identifier for console messages: `{millis}-{7 base36 chars}`
pub fn generate_unique_id() -> String {
	format!("{}-{}", Utc::now().timestamp_millis(), random_suffix(7))
}

/// Identifier for error reports: `req_{millis}_{7 base36 chars}`
pub fn generate_request_id() -> String {
	format!("req_{}_{}", Utc::now().timestamp_millis(), random_suffix(7))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashSet;

	#[rstest]
	fn test_unique_id_shape() {
		let id = generate_unique_id();

		let (millis, suffix) = id.split_once('-').unwrap();
		assert!(millis.parse::<i64>().is_ok());
		assert_eq!(suffix.len(), 7);
		assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
	}

	#[rstest]
	fn test_request_id_shape() {
		let id = generate_request_id();

		let parts: Vec<&str> = id.split('_').collect();
		assert_eq!(parts.len(), 3);
		assert_eq!(parts[0], "req");
		assert!(parts[1].parse::<i64>().is_ok());
		assert_eq!(parts[2].len(), 7);
	}

	#[rstest]
	fn test_ids_do_not_repeat() {
		let ids: HashSet<String> = (0..500).map(|_| generate_unique_id()).collect();

		assert_eq!(ids.len(), 500);
	}
}
