use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ttf_parser::Face;
use ttf_parser::name_id;
use usvg::fontdb;

/// Builds the font database shared by measurement and rasterization.
///
/// System fonts are always loaded. A font file, when given, is added and its
/// family becomes the `sans-serif` generic; an explicit `family` wins over
/// both. If `sans-serif` still names nothing installed, it is pointed at an
/// installed family so labels always have a font to render with.
pub fn load_font_database(
    font_path: Option<&Path>,
    family: Option<&str>,
) -> Result<Arc<fontdb::Database>> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    if let Some(path) = font_path {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read font: {}", path.display()))?;
        let name = family_from_font_data(&data)
            .ok_or_else(|| anyhow!("failed to parse font: {}", path.display()))?;
        db.load_font_data(data);
        info!("loaded overlay font '{}' from {}", name, path.display());
        db.set_sans_serif_family(name);
    }

    if let Some(family) = family.map(str::trim).filter(|name| !name.is_empty()) {
        db.set_sans_serif_family(family);
    }

    if !has_sans_serif(&db) {
        match installed_fallback_family(&db) {
            Some(fallback) => {
                warn!(
                    "sans-serif family '{}' is not installed; using '{}'",
                    db.family_name(&fontdb::Family::SansSerif),
                    fallback
                );
                db.set_sans_serif_family(fallback);
            }
            None => warn!("no fonts available; label text cannot be rendered"),
        }
    }

    debug!("font database ready with {} faces", db.len());
    Ok(Arc::new(db))
}

fn has_sans_serif(db: &fontdb::Database) -> bool {
    let query = fontdb::Query {
        families: &[fontdb::Family::SansSerif],
        ..fontdb::Query::default()
    };
    db.query(&query).is_some()
}

// Prefers a proportional sans face, otherwise the first face loaded.
fn installed_fallback_family(db: &fontdb::Database) -> Option<String> {
    let mut first = None;
    for face in db.faces() {
        let Some((name, _)) = face.families.first() else {
            continue;
        };
        if name.contains("Sans") && !name.contains("Mono") {
            return Some(name.clone());
        }
        first.get_or_insert_with(|| name.clone());
    }
    first
}

pub(crate) fn family_from_font_data(data: &[u8]) -> Option<String> {
    let count = ttf_parser::fonts_in_collection(data).unwrap_or(1);
    (0..count)
        .filter_map(|index| Face::parse(data, index).ok())
        .find_map(|face| extract_family_name(&face))
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sans_serif_resolves_when_system_fonts_exist() {
        let db = load_font_database(None, None).expect("font database");
        if db.len() == 0 {
            return;
        }
        assert!(has_sans_serif(&db));
    }

    #[test]
    fn uninstalled_family_is_replaced_by_installed_one() {
        let db = load_font_database(None, Some("No Such Family 0xdead")).expect("font database");
        if db.len() == 0 {
            return;
        }
        assert_ne!(
            db.family_name(&fontdb::Family::SansSerif),
            "No Such Family 0xdead"
        );
        assert!(has_sans_serif(&db));
    }

    #[test]
    fn empty_database_has_no_fallback() {
        assert_eq!(installed_fallback_family(&fontdb::Database::new()), None);
    }

    #[test]
    fn garbage_font_data_has_no_family() {
        assert_eq!(family_from_font_data(b"not a font"), None);
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.ttf");
        let err = load_font_database(Some(&path), None).expect_err("missing font");
        assert!(err.to_string().contains("failed to read font"));
    }

    #[test]
    fn unparseable_font_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"broken").expect("write font");
        let err = load_font_database(Some(&path), None).expect_err("broken font");
        assert!(err.to_string().contains("failed to parse font"));
    }
}
