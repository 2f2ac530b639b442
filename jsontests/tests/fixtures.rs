use homestead_evm_jsontests::run::{fixture_files, run_file};
use std::path::Path;

#[test]
fn bundled_state_tests_pass() {
	let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("res/state");
	let files = fixture_files(&root).unwrap();
	assert_eq!(files.len(), 3);

	let mut count = 0;
	for file in files {
		for (name, outcome) in run_file(&file).unwrap() {
			assert_eq!(outcome, Ok(()), "{}::{name}", file.display());
			count += 1;
		}
	}
	assert_eq!(count, 13);
}
