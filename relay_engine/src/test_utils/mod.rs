//! Helpers for testing code built on the relay engine: mock collaborators, in-memory client transports and fixtures.
pub mod mocks;
#[cfg(feature = "sqlite")]
pub mod prepare_env;
pub mod transports;

use saas_common::Secret;

use crate::db_types::Principal;

pub fn sample_principal() -> Principal {
    Principal {
        id: 1,
        username: "alice".into(),
        usr: "0f1e2d3c4b5a69788796a5b4c3d2e1f0".into(),
        wallet_id: "5a4b3c2d1e0f5a4b3c2d1e0f5a4b3c2d".into(),
        api_key: Secret::new("c80bda73f47f4539ad2514d9b409c1da".into()),
        lnurlp: Some("LNURL1DP68GURN8GHJ7MRWW4EXCTNXD9SHG6NPVCHXXMMD9AKXUATJDSKHQCTE8AEK2UMND9HKU0TXV4JK2".into()),
        lnurlw: None,
        tpos: None,
    }
}
