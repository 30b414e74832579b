//! Error explanation for one failed build

use xmake_protocol::ErrorDictionary;
use xmake_rules::RuleSet;

use crate::build::Build;
use crate::host::Session;

/// Where an explanation came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplanationSource {
    /// The build's error dictionary artifact
    Dictionary,
    /// A console line matched an error rule
    Console { line_number: usize },
}

/// Error message found for a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub message: String,
    pub source: ExplanationSource,
}

/// Explain why `build` failed.
///
/// The error dictionary artifact is authoritative when it can be fetched;
/// only a failed fetch falls back to scanning the console with `rules`.
pub fn explain_build(
    session: &dyn Session,
    build: &Build,
    rules: &RuleSet,
    dictionary_name: &str,
) -> Option<Explanation> {
    tracing::debug!(
        "Fetching {} for job: '{}' and build number #'{}'",
        dictionary_name,
        build.job_name,
        build.number
    );

    let artifact = match session.fetch_artifact(build, dictionary_name) {
        Ok(artifact) => artifact,
        Err(e) => {
            tracing::info!("Failed to fetch {}: '{}'", dictionary_name, e);
            return scan_console(session, build, rules);
        }
    };

    let content = match artifact.data() {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(
                "failed to read {} artifact for job: '{}' and build number #'{}': '{}'",
                dictionary_name,
                build.job_name,
                build.number,
                e
            );
            return None;
        }
    };

    let dictionary = match ErrorDictionary::parse(&content) {
        Ok(dictionary) => dictionary,
        Err(e) => {
            tracing::warn!("{}", e);
            return None;
        }
    };

    match dictionary.message() {
        Some(message) => {
            tracing::info!("-> found xmake error for job '{}': '{}'", build.job_name, message);
            Some(Explanation {
                message,
                source: ExplanationSource::Dictionary,
            })
        }
        None => {
            tracing::warn!("Can not find any BUILDRESULTS in {}", dictionary_name);
            None
        }
    }
}

fn scan_console(session: &dyn Session, build: &Build, rules: &RuleSet) -> Option<Explanation> {
    let console = match session.console_output(build) {
        Ok(console) => console,
        Err(e) => {
            tracing::warn!("Failed to read console output of build '{}': {}", build.url, e);
            return None;
        }
    };

    let found = rules.scan(&console);
    match found {
        Some(m) => {
            tracing::debug!("Found error: '{}' in line {}: '{}'", m.rule, m.line_number, m.line);
            Some(Explanation {
                message: m.rule.to_string(),
                source: ExplanationSource::Console {
                    line_number: m.line_number,
                },
            })
        }
        None => {
            tracing::debug!("Found no error rule in console log of '{}'", build.url);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildResult;
    use crate::mock::{MockOrchestrator, Operation};

    const DICTIONARY: &str = "error_dictionary.json";
    const DOWNSTREAM_RULE: &str = "USR-JJEN-000: Please check the xmake downstream build log for details";

    fn failed_build(orchestrator: &MockOrchestrator) -> Build {
        orchestrator.add_build("a/job/b", 17, vec![BuildResult::Failure])
    }

    #[test]
    fn test_dictionary_wins() {
        let orchestrator = MockOrchestrator::new("https://j");
        let build = failed_build(&orchestrator);
        orchestrator.add_artifact(&build, DICTIONARY, br#"{"BUILDRESULTS":["CFG-TCLO-0000","msg"]}"#.to_vec());
        orchestrator.set_console(&build, "Job x completed. Result was FAILURE");

        let explanation = explain_build(&orchestrator.session(), &build, &RuleSet::builtin(), DICTIONARY).unwrap();
        assert_eq!(explanation.message, "CFG-TCLO-0000:msg");
        assert_eq!(explanation.source, ExplanationSource::Dictionary);
        assert_eq!(orchestrator.call_count(Operation::ConsoleOutput), 0);
    }

    #[test]
    fn test_dictionary_without_build_results() {
        let orchestrator = MockOrchestrator::new("https://j");
        let build = failed_build(&orchestrator);
        orchestrator.add_artifact(&build, DICTIONARY, br#"{"OTHER":[]}"#.to_vec());
        orchestrator.set_console(&build, "Job x completed. Result was FAILURE");

        assert!(explain_build(&orchestrator.session(), &build, &RuleSet::builtin(), DICTIONARY).is_none());
        assert_eq!(orchestrator.call_count(Operation::ConsoleOutput), 0);
    }

    #[test]
    fn test_unreadable_dictionary() {
        let orchestrator = MockOrchestrator::new("https://j");
        let build = failed_build(&orchestrator);
        orchestrator.add_artifact(&build, DICTIONARY, b"not json".to_vec());

        assert!(explain_build(&orchestrator.session(), &build, &RuleSet::builtin(), DICTIONARY).is_none());
    }

    #[test]
    fn test_console_fallback() {
        let orchestrator = MockOrchestrator::new("https://j");
        let build = failed_build(&orchestrator);
        orchestrator.set_console(&build, "Started\nJob lib-build completed. Result was FAILURE\nFinished");

        let explanation = explain_build(&orchestrator.session(), &build, &RuleSet::builtin(), DICTIONARY).unwrap();
        assert_eq!(explanation.message, DOWNSTREAM_RULE);
        assert_eq!(explanation.source, ExplanationSource::Console { line_number: 2 });
    }

    #[test]
    fn test_console_without_match() {
        let orchestrator = MockOrchestrator::new("https://j");
        let build = failed_build(&orchestrator);
        orchestrator.set_console(&build, "all good");

        assert!(explain_build(&orchestrator.session(), &build, &RuleSet::builtin(), DICTIONARY).is_none());
    }

    #[test]
    fn test_console_unavailable() {
        let orchestrator = MockOrchestrator::new("https://j");
        let build = failed_build(&orchestrator);

        assert!(explain_build(&orchestrator.session(), &build, &RuleSet::builtin(), DICTIONARY).is_none());
        assert_eq!(orchestrator.call_count(Operation::ConsoleOutput), 1);
    }
}
