//! Rule metadata boilerplate.

/// Implements the metadata methods of [`agentlint_core::Rule`] inside an
/// `impl Rule for ...` block.
macro_rules! rule_metadata {
    (
        id: $id:literal,
        description: $description:literal,
        severity: $severity:ident,
        events: [$($event:ident),+ $(,)?],
        pack: $pack:literal $(,)?
    ) => {
        fn id(&self) -> &str {
            $id
        }

        fn description(&self) -> &str {
            $description
        }

        fn severity(&self) -> ::agentlint_core::Severity {
            ::agentlint_core::Severity::$severity
        }

        fn events(&self) -> &[::agentlint_core::HookEvent] {
            &[$(::agentlint_core::HookEvent::$event),+]
        }

        fn pack(&self) -> &str {
            $pack
        }
    };
}
