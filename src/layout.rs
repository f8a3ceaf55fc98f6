use tracing::debug;

use crate::domain::{LayoutMode, RemotePath, year_dir_name};
use crate::error::IndexError;
use crate::listing::DirectoryLister;

/// Probes `base/user` for `data_{year}` or `mc_{year}` directories.
///
/// An unlistable user directory counts as the old layout.
pub fn detect_layout<L: DirectoryLister + ?Sized>(
    lister: &L,
    base: &RemotePath,
    user: &str,
    years: &[String],
) -> Result<LayoutMode, IndexError> {
    let user_path = base / user;
    let contents = match lister.list(&user_path) {
        Ok(contents) => contents,
        Err(err) if err.is_not_found() => {
            debug!("cannot list {user_path}, assuming old layout");
            return Ok(LayoutMode::Old);
        }
        Err(err) => return Err(err),
    };

    let has_new = years.iter().any(|year| {
        [true, false]
            .iter()
            .any(|is_data| contents.contains(&year_dir_name(year, *is_data)))
    });

    Ok(if has_new {
        LayoutMode::New
    } else {
        LayoutMode::Old
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::MemoryLister;

    fn years() -> Vec<String> {
        vec!["2022".to_string(), "2023".to_string()]
    }

    #[test]
    fn data_marker_means_new() {
        let lister = MemoryLister::from_paths(["/base/alice/data_2022/x"]);
        let mode = detect_layout(&lister, &RemotePath::new("/base"), "alice", &years()).unwrap();
        assert_eq!(mode, LayoutMode::New);
    }

    #[test]
    fn bare_year_means_old() {
        let lister = MemoryLister::from_paths(["/base/alice/2022/x"]);
        let mode = detect_layout(&lister, &RemotePath::new("/base"), "alice", &years()).unwrap();
        assert_eq!(mode, LayoutMode::Old);
    }

    #[test]
    fn missing_user_defaults_to_old() {
        let lister = MemoryLister::new();
        let mode = detect_layout(&lister, &RemotePath::new("/base"), "alice", &years()).unwrap();
        assert_eq!(mode, LayoutMode::Old);
    }

    #[test]
    fn markers_for_unrequested_years_are_ignored() {
        let lister = MemoryLister::from_paths(["/base/alice/mc_2024/x"]);
        let mode = detect_layout(&lister, &RemotePath::new("/base"), "alice", &years()).unwrap();
        assert_eq!(mode, LayoutMode::Old);
    }
}
