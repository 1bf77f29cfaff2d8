//! Loading raw dataset bytes from a local file or over HTTP.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

/// Fetches a URL with a blocking client.
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let resp = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(resp.bytes()?.to_vec())
}

/// Loads dataset bytes from a local path or an `http(s)` URL, transparently
/// decompressing gzip payloads.
#[tracing::instrument(fields(source = %source))]
pub fn load_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if is_url(source) {
        fetch_bytes(source).with_context(|| format!("failed to fetch '{source}'"))?
    } else {
        std::fs::read(source).with_context(|| format!("failed to read '{source}'"))?
    };
    debug!(bytes = bytes.len(), "Source loaded");

    maybe_gunzip(bytes)
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Decompresses `bytes` when they start with the gzip magic number.
pub fn maybe_gunzip(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !bytes.starts_with(&[0x1f, 0x8b]) {
        return Ok(bytes);
    }

    let mut decoder = GzDecoder::new(bytes.as_slice());
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .context("failed to decompress gzip source")?;
    debug!(decompressed = out.len(), "Gzip source decompressed");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::env;
    use std::fs;
    use std::io::Write;

    #[test]
    fn test_plain_bytes_pass_through() {
        let bytes = b"FechaHora,CO2e_t\n".to_vec();
        assert_eq!(maybe_gunzip(bytes.clone()).unwrap(), bytes);
    }

    #[test]
    fn test_gzip_bytes_are_decompressed() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"FechaHora,CO2e_t\n").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(maybe_gunzip(compressed).unwrap(), b"FechaHora,CO2e_t\n");
    }

    #[test]
    fn test_truncated_gzip_is_an_error() {
        assert!(maybe_gunzip(vec![0x1f, 0x8b, 0x08]).is_err());
    }

    #[test]
    fn test_load_source_reads_local_file() {
        let path = format!("{}/sen_emissions_fetch_test.csv", env::temp_dir().display());
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let bytes = load_source(&path).unwrap();
        assert_eq!(bytes, b"a,b\n1,2\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_only_http_schemes_are_urls() {
        assert!(is_url("https://www.coordinador.cl/emisiones.csv"));
        assert!(is_url("http://localhost:8080/emisiones.csv.gz"));
        assert!(!is_url("httpdump.csv"));
        assert!(!is_url("http_exports/enero.csv"));
        assert!(!is_url("data/enero.csv"));
    }

    #[test]
    fn test_load_source_missing_file() {
        assert!(load_source("/no/such/emissions.csv").is_err());
    }
}
