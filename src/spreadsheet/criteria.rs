use glob::Pattern;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Criteria for selecting which worksheets of a document are read.
#[derive(Clone, Debug, Default)]
pub struct Criteria {
    /// Worksheet name patterns; None accepts every worksheet.
    pub sheet_name_patterns: Option<Vec<Pattern>>,

    /// Maximum number of worksheets to read.
    pub sheet_limit: Option<usize>,

    /// Checked between worksheets; once set, the remaining worksheets are not fetched.
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl Criteria {
    /// Builds criteria from glob patterns such as `Sheet*` or `Report ?`.
    pub fn with_patterns<I, S>(patterns: I) -> Result<Self, glob::PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| Pattern::new(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            sheet_name_patterns: Some(patterns).filter(|patterns| !patterns.is_empty()),
            ..Self::default()
        })
    }

    /// Checks if a sheet name matches the criteria patterns.
    /// Returns true if no patterns are specified or if name matches any pattern.
    pub fn accept(&self, sheet_name: &str) -> bool {
        if let Some(patterns) = &self.sheet_name_patterns {
            patterns.iter().any(|pattern| pattern.matches(sheet_name))
        } else {
            true
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_accepts_everything_by_default() {
        let criteria = Criteria::default();
        assert!(criteria.accept("Sheet1"));
        assert!(criteria.accept(""));
        assert!(!criteria.is_cancelled());
    }

    #[test]
    fn criteria_patterns() {
        let criteria = Criteria::with_patterns(["Sheet*", "Summary"]).unwrap();
        assert!(criteria.accept("Sheet1"));
        assert!(criteria.accept("Summary"));
        assert!(!criteria.accept("Data"));

        let criteria = Criteria::with_patterns(Vec::<String>::new()).unwrap();
        assert!(criteria.sheet_name_patterns.is_none());
        assert!(Criteria::with_patterns(["[a"]).is_err());
    }

    #[test]
    fn criteria_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let criteria = Criteria {
            cancel_flag: Some(flag.clone()),
            ..Criteria::default()
        };
        assert!(!criteria.is_cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(criteria.is_cancelled());
    }
}
