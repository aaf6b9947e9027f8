//! Sample trees, requests and environment helpers.

use std::collections::HashMap;

use sourcesnap_core::{OriginRepo, RequestError, SnapshotRequest};

use crate::mocks::FakeOrigin;

/// Owner used by the sample requests.
pub const SAMPLE_OWNER: &str = "octo";
/// Repository used by the sample requests.
pub const SAMPLE_REPO: &str = "demo";
/// Ref used by the sample requests.
pub const SAMPLE_REF: &str = "main";
/// Identity segments used by the sample requests.
pub const SAMPLE_IDENTITY: [&str; 2] = ["42", "job1"];

/// Tree with `README.md`, `src/a.txt` and `src/sub/b.txt`.
#[must_use]
pub fn sample_origin() -> FakeOrigin {
    FakeOrigin::new()
        .with_file("README.md", "# demo\n")
        .with_file("src/a.txt", "alpha")
        .with_file("src/sub/b.txt", "bravo")
}

/// Request against the sample repository rooted at `root_path`.
///
/// # Errors
///
/// Propagates request validation failures.
pub fn sample_request(root_path: &str) -> Result<SnapshotRequest, RequestError> {
    SnapshotRequest::new(
        OriginRepo::new(SAMPLE_OWNER, SAMPLE_REPO),
        SAMPLE_REF,
        root_path,
        SAMPLE_IDENTITY,
    )
}

/// Build an environment lookup backed by a fixed set of pairs.
pub fn env_lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}
