//! 패턴 매칭 모듈
//!
//! glob 패턴을 사용한 입력 경로 필터링을 담당합니다.

use glob::{MatchOptions, Pattern};

use crate::error::{Result, Trx2JunitError};

/// 와일드카드로 취급하는 문자
const WILDCARD_CHARS: [char; 3] = ['*', '?', '['];

/// 경로 구분자를 넘지 않도록 매칭 (`**`만 여러 폴더에 매칭)
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// 문자열에 와일드카드 문자가 포함되어 있는지 확인
///
/// # Examples
/// ```
/// use trx2junit::pattern::has_wildcards;
///
/// assert!(has_wildcards("results/*.trx"));
/// assert!(!has_wildcards("results/run.trx"));
/// ```
pub fn has_wildcards(input: &str) -> bool {
    input.contains(&WILDCARD_CHARS[..])
}

/// 컴파일된 패턴 매처
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Pattern,
}

impl PatternMatcher {
    /// 새 패턴 매처 생성
    ///
    /// # Arguments
    /// * `pattern` - 글로브 패턴 문자열 (`/`로 구분된 상대 경로)
    ///
    /// # Returns
    /// 컴파일된 `PatternMatcher` 또는 에러
    ///
    /// # Examples
    /// ```
    /// use trx2junit::pattern::PatternMatcher;
    ///
    /// let matcher = PatternMatcher::new("*.trx").unwrap();
    /// assert!(matcher.matches("run1.trx"));
    /// assert!(!matcher.matches("nested/run1.trx"));
    /// ```
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled = Pattern::new(pattern).map_err(|_| Trx2JunitError::InvalidPattern {
            pattern: pattern.to_string(),
        })?;

        Ok(Self { pattern: compiled })
    }

    /// 상대 경로가 패턴과 일치하는지 확인
    pub fn matches(&self, relative_path: &str) -> bool {
        self.pattern.matches_with(relative_path, MATCH_OPTIONS)
    }

    /// 여러 폴더 깊이에 매칭할 수 있는 패턴인지 확인 (`**` 포함)
    pub fn is_recursive(&self) -> bool {
        self.pattern.as_str().split('/').any(|c| c == "**")
    }

    /// 패턴이 검사하는 폴더 깊이 (구성 요소 수)
    pub fn depth(&self) -> usize {
        self.pattern.as_str().split('/').count()
    }
}
