#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use proptest::prelude::*;

    use crate::config::{Config, TracingConfig};
    use crate::safety::{CONFIRMATION_WORD, PromptHandler, SafetyChecker};
    use crate::test_utils::make_test_config;
    use crate::types::error::DcrmError;

    const TARGET: &str = "messages by user 7 in test-community from the last 7 days";

    /// Interactive handler returning a canned answer.
    struct MockPromptHandler {
        response: String,
    }

    impl MockPromptHandler {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
            }
        }
    }

    impl PromptHandler for MockPromptHandler {
        fn read_confirmation(&self, _target_display: &str) -> Result<String> {
            Ok(self.response.clone())
        }

        fn is_interactive(&self) -> bool {
            true
        }
    }

    /// Records what the prompt was asked to display.
    struct CapturingPromptHandler {
        response: String,
        captured_target: Arc<Mutex<Option<String>>>,
    }

    impl PromptHandler for CapturingPromptHandler {
        fn read_confirmation(&self, target_display: &str) -> Result<String> {
            *self.captured_target.lock().unwrap() = Some(target_display.to_string());
            Ok(self.response.clone())
        }

        fn is_interactive(&self) -> bool {
            true
        }
    }

    /// Fails the test if the prompt is ever shown.
    struct NonInteractivePromptHandler;

    impl PromptHandler for NonInteractivePromptHandler {
        fn read_confirmation(&self, _target_display: &str) -> Result<String> {
            panic!("read_confirmation must not be called in a non-interactive environment");
        }

        fn is_interactive(&self) -> bool {
            false
        }
    }

    fn make_config(dry_run: bool, force: bool, json_tracing: bool) -> Config {
        let mut config = make_test_config();
        config.dry_run = dry_run;
        config.force = force;
        config.tracing_config = Some(TracingConfig {
            tracing_level: log::Level::Info,
            json_tracing,
            serenity_tracing: false,
            span_events_tracing: false,
            disable_color_tracing: false,
        });
        config
    }

    fn assert_cancelled(result: Result<()>, input: &str) {
        let err = result.expect_err(&format!("input '{input}' should be rejected"));
        assert_eq!(
            err.downcast_ref::<DcrmError>(),
            Some(&DcrmError::Cancelled),
            "input '{input}' should produce Cancelled"
        );
    }

    // -----------------------------------------------------------------------
    // Dry run and force
    // -----------------------------------------------------------------------

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn dry_run_never_prompts(force in proptest::bool::ANY, json_tracing in proptest::bool::ANY) {
            let config = make_config(true, force, json_tracing);
            let checker = SafetyChecker::with_prompt_handler(&config, Box::new(MockPromptHandler::new("no")));

            prop_assert!(checker.check_before_deletion(TARGET).is_ok());
        }

        #[test]
        fn force_never_prompts(json_tracing in proptest::bool::ANY) {
            let config = make_config(false, true, json_tracing);
            let checker = SafetyChecker::with_prompt_handler(&config, Box::new(MockPromptHandler::new("no")));

            prop_assert!(checker.check_before_deletion(TARGET).is_ok());
        }
    }

    // -----------------------------------------------------------------------
    // Confirmation word
    // -----------------------------------------------------------------------

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn anything_but_the_exact_word_cancels(input in "[a-zA-Z0-9 ]{0,20}") {
            prop_assume!(input != CONFIRMATION_WORD);

            let config = make_config(false, false, false);
            let checker = SafetyChecker::with_prompt_handler(&config, Box::new(MockPromptHandler::new(&input)));

            let err = checker.check_before_deletion(TARGET).unwrap_err();
            prop_assert_eq!(err.downcast_ref::<DcrmError>(), Some(&DcrmError::Cancelled));
        }

        #[test]
        fn prompt_receives_target_display(target in "[a-z0-9 #-]{1,40}") {
            let captured = Arc::new(Mutex::new(None));
            let handler = CapturingPromptHandler {
                response: CONFIRMATION_WORD.to_string(),
                captured_target: captured.clone(),
            };
            let config = make_config(false, false, false);
            let checker = SafetyChecker::with_prompt_handler(&config, Box::new(handler));

            prop_assert!(checker.check_before_deletion(&target).is_ok());
            let got = captured.lock().unwrap().clone();
            prop_assert_eq!(got.as_deref(), Some(target.as_str()));
        }
    }

    #[test]
    fn exact_word_is_accepted() {
        let config = make_config(false, false, false);
        let checker = SafetyChecker::with_prompt_handler(
            &config,
            Box::new(MockPromptHandler::new(CONFIRMATION_WORD)),
        );

        assert!(checker.check_before_deletion(TARGET).is_ok());
    }

    #[test]
    fn near_misses_are_rejected() {
        for input in ["delete", "Delete", "DEL", "yes", "y", "DELETE!", ""] {
            let config = make_config(false, false, false);
            let checker =
                SafetyChecker::with_prompt_handler(&config, Box::new(MockPromptHandler::new(input)));

            assert_cancelled(checker.check_before_deletion(TARGET), input);
        }
    }

    #[test]
    fn cancelled_maps_to_aborted_exit_code() {
        let config = make_config(false, false, false);
        let checker =
            SafetyChecker::with_prompt_handler(&config, Box::new(MockPromptHandler::new("no")));

        let err = checker.check_before_deletion(TARGET).unwrap_err();
        assert!(crate::types::error::is_cancelled_error(&err));
    }

    // -----------------------------------------------------------------------
    // Prompt suppression
    // -----------------------------------------------------------------------

    #[test]
    fn json_logging_skips_prompt() {
        let config = make_config(false, false, true);
        let checker =
            SafetyChecker::with_prompt_handler(&config, Box::new(MockPromptHandler::new("no")));

        assert!(checker.check_before_deletion(TARGET).is_ok());
    }

    #[test]
    fn non_interactive_environment_skips_prompt() {
        let config = make_config(false, false, false);
        let checker =
            SafetyChecker::with_prompt_handler(&config, Box::new(NonInteractivePromptHandler));

        assert!(checker.check_before_deletion(TARGET).is_ok());
    }

    #[test]
    fn checker_without_tracing_config_still_prompts() {
        let mut config = make_config(false, false, false);
        config.tracing_config = None;
        let checker =
            SafetyChecker::with_prompt_handler(&config, Box::new(MockPromptHandler::new("no")));

        assert_cancelled(checker.check_before_deletion(TARGET), "no");
    }
}
