//! TLS key material for the server side of the container.
//!
//! The material is copied into the container at fixed paths; a server
//! configuration enabling `ssl = on` must reference those paths (see the
//! `SSL_*_FILE` constants). The server refuses key files that are owned by the
//! wrong user or too permissive, and copied files land as root-owned, so the
//! container command is wrapped in a small shell shim that fixes ownership and
//! mode before handing off to the stock entrypoint.

use std::fs;
use std::path::Path;

use testcontainers::CopyToContainer;

use crate::error::{Error, Result};

/// In-container path of the CA certificate.
pub const SSL_CA_FILE: &str = "/tmp/pgcage/certs/ca.pem";
/// In-container path of the server certificate.
pub const SSL_CERT_FILE: &str = "/tmp/pgcage/certs/server.pem";
/// In-container path of the server private key.
pub const SSL_KEY_FILE: &str = "/tmp/pgcage/certs/server.key";

pub(crate) const SSL_ENTRYPOINT_PATH: &str = "/usr/local/bin/pgcage-ssl-entrypoint.sh";

const SSL_ENTRYPOINT: &str = "\
#!/bin/sh
set -e
chown postgres:postgres /tmp/pgcage/certs/ca.pem /tmp/pgcage/certs/server.pem /tmp/pgcage/certs/server.key
chmod 600 /tmp/pgcage/certs/ca.pem /tmp/pgcage/certs/server.pem /tmp/pgcage/certs/server.key
exec docker-entrypoint.sh \"$@\"
";

/// Validate the key material and turn it into container copy sources.
pub(crate) fn copy_sources(ca: &Path, cert: &Path, key: &Path) -> Result<Vec<CopyToContainer>> {
    Ok(vec![
        CopyToContainer::new(read_material("CA certificate", ca)?, SSL_CA_FILE),
        CopyToContainer::new(read_material("server certificate", cert)?, SSL_CERT_FILE),
        CopyToContainer::new(read_material("server key", key)?, SSL_KEY_FILE),
        CopyToContainer::new(SSL_ENTRYPOINT.as_bytes().to_vec(), SSL_ENTRYPOINT_PATH),
    ])
}

fn read_material(what: &str, path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str().is_empty() {
        return Err(Error::SslMaterial(format!("{what} path is empty")));
    }
    let bytes = fs::read(path)
        .map_err(|e| Error::SslMaterial(format!("{what} at {}: {e}", path.display())))?;
    if bytes.is_empty() {
        return Err(Error::SslMaterial(format!(
            "{what} at {} is empty",
            path.display()
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn testdata_cert(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/testdata/certs")
            .join(name)
    }

    #[test]
    fn test_rejects_empty_paths() {
        let err = copy_sources(Path::new(""), Path::new(""), Path::new("")).unwrap_err();
        assert!(matches!(err, Error::SslMaterial(_)));
    }

    #[test]
    fn test_rejects_missing_files() {
        let err = copy_sources(
            Path::new("/nonexistent/ca.pem"),
            Path::new("/nonexistent/server.pem"),
            Path::new("/nonexistent/server.key"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SslMaterial(_)));
    }

    #[test]
    fn test_accepts_real_material() {
        let sources = copy_sources(
            &testdata_cert("ca.pem"),
            &testdata_cert("server.pem"),
            &testdata_cert("server.key"),
        )
        .unwrap();
        // three certs plus the entrypoint shim
        assert_eq!(sources.len(), 4);
    }
}
