//! 와일드카드 확장 모듈
//!
//! 요청된 입력 목록의 글로브 패턴을 실제 존재하는 파일 경로 목록으로 확장합니다.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::fs::FileSystem;
use crate::options::RunOptions;
use crate::pattern::has_wildcards;

/// 확장 결과 파일이 없어 제외된 입력
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedInput {
    /// 요청된 경로 또는 패턴
    pub input: String,
    /// 제외 사유
    pub reason: String,
}

/// 입력 목록 확장 기능
pub trait GlobHandler: Send + Sync {
    /// `options.input_files`를 실제 파일 목록으로 교체하고 제외된 입력을 반환
    ///
    /// 이미 확장된 목록에 다시 호출해도 결과가 같아야 합니다.
    fn expand_wildcards(&self, options: &mut RunOptions) -> Vec<UnresolvedInput>;
}

/// `FileSystem`을 사용하는 기본 구현
pub struct DefaultGlobHandler {
    file_system: Arc<dyn FileSystem>,
}

impl DefaultGlobHandler {
    /// 새 핸들러 생성
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        Self { file_system }
    }

    fn resolve(&self, input: &str) -> Result<Vec<String>, String> {
        if self.file_system.is_file(Path::new(input)) {
            return Ok(vec![input.to_string()]);
        }

        if !has_wildcards(input) {
            return Err("파일이 존재하지 않습니다".to_string());
        }

        let files = self
            .file_system
            .find_files(input)
            .map_err(|e| e.to_string())?;

        if files.is_empty() {
            return Err("일치하는 파일이 없습니다".to_string());
        }

        Ok(files
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect())
    }
}

impl GlobHandler for DefaultGlobHandler {
    fn expand_wildcards(&self, options: &mut RunOptions) -> Vec<UnresolvedInput> {
        let mut seen = HashSet::new();
        let mut expanded = Vec::with_capacity(options.input_files.len());
        let mut unresolved = Vec::new();

        for input in &options.input_files {
            match self.resolve(input) {
                Ok(files) => {
                    for file in files {
                        if seen.insert(file.clone()) {
                            expanded.push(file);
                        }
                    }
                }
                Err(reason) => unresolved.push(UnresolvedInput {
                    input: input.clone(),
                    reason,
                }),
            }
        }

        options.input_files = expanded;
        unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::OsFileSystem;
    use std::fs;
    use tempfile::TempDir;

    fn handler() -> DefaultGlobHandler {
        DefaultGlobHandler::new(Arc::new(OsFileSystem::new()))
    }

    fn setup() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for name in ["a.trx", "b.trx", "c.xml"] {
            fs::write(temp_dir.path().join(name), "<TestRun/>").unwrap();
        }
        temp_dir
    }

    fn path_of(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn test_literal_paths_pass_through() {
        let temp_dir = setup();
        let mut options = RunOptions::new([path_of(&temp_dir, "b.trx"), path_of(&temp_dir, "a.trx")]);

        let unresolved = handler().expand_wildcards(&mut options);

        assert!(unresolved.is_empty());
        assert_eq!(
            options.input_files,
            vec![path_of(&temp_dir, "b.trx"), path_of(&temp_dir, "a.trx")]
        );
    }

    #[test]
    fn test_wildcard_expansion_sorted() {
        let temp_dir = setup();
        let mut options = RunOptions::new([path_of(&temp_dir, "*.trx")]);

        handler().expand_wildcards(&mut options);

        assert_eq!(
            options.input_files,
            vec![path_of(&temp_dir, "a.trx"), path_of(&temp_dir, "b.trx")]
        );
    }

    #[test]
    fn test_duplicates_removed() {
        let temp_dir = setup();
        let mut options = RunOptions::new([
            path_of(&temp_dir, "a.trx"),
            path_of(&temp_dir, "*.trx"),
            path_of(&temp_dir, "?.trx"),
        ]);

        handler().expand_wildcards(&mut options);

        assert_eq!(
            options.input_files,
            vec![path_of(&temp_dir, "a.trx"), path_of(&temp_dir, "b.trx")]
        );
    }

    #[test]
    fn test_missing_entries_dropped() {
        let temp_dir = setup();
        let mut options = RunOptions::new([
            path_of(&temp_dir, "missing.trx"),
            path_of(&temp_dir, "*.junit"),
            path_of(&temp_dir, "c.xml"),
        ]);

        let unresolved = handler().expand_wildcards(&mut options);

        assert_eq!(options.input_files, vec![path_of(&temp_dir, "c.xml")]);
        assert_eq!(unresolved.len(), 2);
        assert_eq!(unresolved[0].input, path_of(&temp_dir, "missing.trx"));
    }

    #[test]
    fn test_invalid_pattern_dropped() {
        let temp_dir = setup();
        let mut options = RunOptions::new([path_of(&temp_dir, "[invalid*.trx")]);

        let unresolved = handler().expand_wildcards(&mut options);

        assert!(options.input_files.is_empty());
        assert_eq!(unresolved.len(), 1);
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let temp_dir = setup();
        let mut options = RunOptions::new([path_of(&temp_dir, "*.trx")]);

        handler().expand_wildcards(&mut options);
        let first = options.input_files.clone();
        let unresolved = handler().expand_wildcards(&mut options);

        assert!(unresolved.is_empty());
        assert_eq!(options.input_files, first);
    }
}
