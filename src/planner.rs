/// Move planning.
///
/// Turns a directory listing into an ordered, collision-free sequence of
/// planned moves. Planning performs no writes; the engine executes the plan.
use crate::category::RuleSet;
use crate::collision;
use crate::config::ExclusionSpec;
use crate::engine::OrganizeError;
use crate::fsio::FileSystem;
use crate::ledger::LEDGER_FILE_NAME;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One proposed move: where a file is, where it should go, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: String,
}

/// Plans the moves for one run over `source_dir`.
///
/// Only immediate regular-file entries are considered; subdirectories
/// (including the output root) are never sources. Exclusions are applied
/// before categorization, and the ledger file is excluded unconditionally.
/// Entries are processed in a stable file-name order so runs are
/// deterministic, and destinations already claimed earlier in the plan count
/// as occupied when disambiguating.
pub fn plan<F: FileSystem>(
    fs: &F,
    source_dir: &Path,
    rules: &RuleSet,
    exclusions: &ExclusionSpec,
    output_root: &str,
) -> Result<Vec<PlannedMove>, OrganizeError> {
    let mut files = fs
        .list_files(source_dir)
        .map_err(|e| OrganizeError::ScanFailed {
            path: source_dir.to_path_buf(),
            source: e,
        })?;
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let output_dir = source_dir.join(output_root);
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut moves = Vec::new();

    for source in files {
        let Some(name) = source.file_name() else {
            continue;
        };
        let name = name.to_string_lossy().into_owned();
        // The output root is normally a directory and filtered by the
        // listing, but a plain file with that name must not become a source
        // either: its destination would sit underneath itself.
        if name == LEDGER_FILE_NAME || name == output_root || exclusions.is_excluded(&name) {
            continue;
        }

        let category = rules.resolve(&name).to_string();
        let desired = output_dir.join(&category).join(&name);
        let destination =
            collision::unique_path(&desired, |p| claimed.contains(p) || fs.exists(p))
                .map_err(OrganizeError::Collision)?;
        claimed.insert(destination.clone());

        moves.push(PlannedMove {
            source,
            destination,
            category,
        });
    }

    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExclusionRules, ExclusionSpec};
    use crate::fsio::OsFileSystem;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn rules() -> RuleSet {
        let mut categories = BTreeMap::new();
        categories.insert("Documents".to_string(), vec!["txt".to_string()]);
        categories.insert("Images".to_string(), vec!["png".to_string()]);
        RuleSet::build(&categories).unwrap()
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "x").unwrap();
    }

    #[test]
    fn test_plan_is_sorted_by_file_name() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "c.txt");
        touch(temp_dir.path(), "a.txt");
        touch(temp_dir.path(), "b.txt");

        let plan = plan(
            &OsFileSystem,
            temp_dir.path(),
            &rules(),
            &ExclusionSpec::none(),
            "Organized_Files",
        )
        .unwrap();

        let names: Vec<_> = plan
            .iter()
            .map(|m| m.source.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_plan_routes_files_to_category_dirs() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "note.txt");
        touch(temp_dir.path(), "photo.png");
        touch(temp_dir.path(), "blob.xyz");

        let plan = plan(
            &OsFileSystem,
            temp_dir.path(),
            &rules(),
            &ExclusionSpec::none(),
            "Organized_Files",
        )
        .unwrap();

        let out = temp_dir.path().join("Organized_Files");
        let by_name: std::collections::HashMap<_, _> = plan
            .iter()
            .map(|m| {
                (
                    m.source.file_name().unwrap().to_string_lossy().into_owned(),
                    m.destination.clone(),
                )
            })
            .collect();
        assert_eq!(by_name["note.txt"], out.join("Documents").join("note.txt"));
        assert_eq!(by_name["photo.png"], out.join("Images").join("photo.png"));
        assert_eq!(by_name["blob.xyz"], out.join("Other").join("blob.xyz"));
    }

    #[test]
    fn test_plan_skips_directories_and_ledger_file() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "a.txt");
        touch(temp_dir.path(), LEDGER_FILE_NAME);
        fs::create_dir(temp_dir.path().join("Organized_Files")).unwrap();
        fs::create_dir(temp_dir.path().join("some_dir")).unwrap();

        let plan = plan(
            &OsFileSystem,
            temp_dir.path(),
            &rules(),
            &ExclusionSpec::none(),
            "Organized_Files",
        )
        .unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].source, temp_dir.path().join("a.txt"));
    }

    #[test]
    fn test_plan_skips_a_file_named_like_the_output_root() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "a.txt");
        touch(temp_dir.path(), "Organized_Files");

        let plan = plan(
            &OsFileSystem,
            temp_dir.path(),
            &rules(),
            &ExclusionSpec::none(),
            "Organized_Files",
        )
        .unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].source, temp_dir.path().join("a.txt"));
    }

    #[test]
    fn test_excluded_file_never_appears_in_plan() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "keep.txt");
        touch(temp_dir.path(), "skip.txt");

        let exclusions = ExclusionSpec::compile(ExclusionRules {
            names: vec!["skip.txt".to_string()],
            skip_hidden: false,
            ..ExclusionRules::default()
        })
        .unwrap();

        let plan = plan(
            &OsFileSystem,
            temp_dir.path(),
            &rules(),
            &exclusions,
            "Organized_Files",
        )
        .unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].source, temp_dir.path().join("keep.txt"));
    }

    #[test]
    fn test_plan_disambiguates_against_existing_destination() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "a.txt");
        let docs = temp_dir.path().join("Organized_Files").join("Documents");
        fs::create_dir_all(&docs).unwrap();
        touch(&docs, "a.txt");

        let plan = plan(
            &OsFileSystem,
            temp_dir.path(),
            &rules(),
            &ExclusionSpec::none(),
            "Organized_Files",
        )
        .unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].destination, docs.join("a (1).txt"));
    }

    #[test]
    fn test_no_two_planned_moves_share_a_destination() {
        // Same desired destination can only happen through disambiguated
        // variants already claimed within the plan.
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "a.txt");
        touch(temp_dir.path(), "a (1).txt");
        let docs = temp_dir.path().join("Organized_Files").join("Documents");
        fs::create_dir_all(&docs).unwrap();
        touch(&docs, "a.txt");

        let plan = plan(
            &OsFileSystem,
            temp_dir.path(),
            &rules(),
            &ExclusionSpec::none(),
            "Organized_Files",
        )
        .unwrap();

        let mut destinations: Vec<_> = plan.iter().map(|m| m.destination.clone()).collect();
        let total = destinations.len();
        destinations.sort();
        destinations.dedup();
        assert_eq!(destinations.len(), total);
    }
}
