//! Application identities used to attribute writes.
//!
//! An identity looks like `<hostname>-<label>` or, once a source has been
//! committed, `<hostname>-<label>-<5 digits>`. The suffix keeps two sources
//! on the same machine from sharing an entries file.

use rand::Rng;

use crate::source::SourceConfig;

/// Label used when the configuration does not name one.
pub const DEFAULT_APP_LABEL: &str = "colsync";

const SUFFIX_RANGE: u32 = 100_000;

fn host() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

pub fn derive_app_id(label: &str) -> String {
    format!("{}-{label}", host())
}

pub fn derive_app_id_with_suffix(label: &str, suffix: u32) -> String {
    format!("{}-{label}-{suffix:05}", host())
}

/// Returns the identity of `source`, generating and storing one first if it
/// has none.
pub fn ensure_identity<'s>(source: &'s mut SourceConfig, label: &str) -> &'s str {
    ensure_identity_with_rng(source, label, &mut rand::thread_rng())
}

pub fn ensure_identity_with_rng<'s, R: Rng>(
    source: &'s mut SourceConfig,
    label: &str,
    rng: &mut R,
) -> &'s str {
    if source.app_id.as_deref().is_none_or(str::is_empty) {
        let app_id = derive_app_id_with_suffix(label, rng.gen_range(0..SUFFIX_RANGE));
        tracing::debug!(%app_id, "provisioned application identity");
        source.app_id = Some(app_id);
    }

    source.app_id.as_deref().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn suffix_is_zero_padded() {
        let id = derive_app_id_with_suffix("colsync", 42);
        assert!(id.ends_with("-colsync-00042"), "{id}");
        assert!(derive_app_id("colsync").ends_with("-colsync"));
    }

    #[test]
    fn generates_identity_once() {
        let mut source = SourceConfig::default();
        let mut rng = StdRng::seed_from_u64(7);

        let first = ensure_identity_with_rng(&mut source, "colsync", &mut rng).to_string();
        let second = ensure_identity_with_rng(&mut source, "colsync", &mut rng).to_string();

        assert_eq!(first, second);
        assert_eq!(source.app_id.as_deref(), Some(first.as_str()));
    }

    #[test]
    fn empty_identity_is_replaced() {
        let mut source = SourceConfig {
            app_id: Some(String::new()),
            ..SourceConfig::default()
        };
        let id = ensure_identity(&mut source, "colsync").to_string();
        assert!(id.contains("-colsync-"));
    }

    #[test]
    fn existing_identity_is_kept() {
        let mut source = SourceConfig {
            app_id: Some("desk-colsync-12345".into()),
            ..SourceConfig::default()
        };
        assert_eq!(ensure_identity(&mut source, "other"), "desk-colsync-12345");
    }
}
