//! Command handling
//!
//! The engine gates a query through the pre-check (in voting modes) and then
//! hands it to the correction loop.

use std::sync::Arc;

use tracing::info;

use crate::ensemble::{OraclePanel, Resolver};
use crate::executor::SqlExecutor;
use crate::feedback::{CommandOutcome, CorrectionConfig, CorrectionLoop};
use crate::operator::{Confirmation, LoopEvent, Operator};
use crate::precheck::{self, Plausibility};
use crate::session::Session;

pub struct Engine {
    panel: OraclePanel,
    executor: Arc<dyn SqlExecutor>,
    config: CorrectionConfig,
}

impl Engine {
    pub fn new(panel: OraclePanel, executor: Arc<dyn SqlExecutor>) -> Self {
        Self {
            panel,
            executor,
            config: CorrectionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CorrectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn panel(&self) -> &OraclePanel {
        &self.panel
    }

    /// Handle one natural-language command to completion.
    pub async fn handle(
        &self,
        session: &Session,
        query: &str,
        operator: &dyn Operator,
    ) -> CommandOutcome {
        let mode = session.mode();

        if mode.uses_precheck() {
            let verdict = precheck::check(self.panel.primary(), session.prompts(), query).await;
            if let Plausibility::Implausible { reason } = verdict {
                operator.notify(&LoopEvent::PrecheckRejected { reason: &reason });
                if !operator.confirm(&Confirmation::ForceAfterPrecheck { reason: &reason }) {
                    info!(reason = %reason, "Command dismissed after pre-check");
                    return CommandOutcome::Dismissed { reason };
                }
                info!("Pre-check overridden by operator");
            }
        }

        CorrectionLoop::new(
            Resolver::new(&self.panel, session.prompts()),
            self.executor.as_ref(),
            self.config,
        )
        .run(mode, query, operator)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::ConsensusMode;
    use crate::operator::{AutoApprove, AutoDeny};
    use crate::test_support::{adapter, orders_schema, ScriptedExecutor, ScriptedOracle};

    fn engine(gpt: &Arc<ScriptedOracle>, executor: Arc<ScriptedExecutor>) -> Engine {
        Engine::new(OraclePanel::new(adapter(gpt), Vec::new()), executor)
    }

    #[tokio::test]
    async fn test_simple_mode_skips_precheck() {
        let gpt = Arc::new(ScriptedOracle::new("gpt").translating(["SHOW TABLES"]));
        let executor = Arc::new(ScriptedExecutor::default());
        let session = Session::new(orders_schema(), ConsensusMode::Simple);

        let outcome = engine(&gpt, executor.clone())
            .handle(&session, "show all tables", &AutoDeny)
            .await;

        assert!(outcome.is_success());
        assert_eq!(gpt.prechecks(), 0);
    }

    #[tokio::test]
    async fn test_rejected_precheck_dismisses_without_translating() {
        let gpt = Arc::new(
            ScriptedOracle::new("gpt")
                .classifying(["False greeting"])
                .translating(["SHOW TABLES"]),
        );
        let executor = Arc::new(ScriptedExecutor::default());
        let session = Session::new(orders_schema(), ConsensusMode::Base);

        let outcome = engine(&gpt, executor.clone())
            .handle(&session, "hello there", &AutoDeny)
            .await;

        assert_eq!(
            outcome,
            CommandOutcome::Dismissed {
                reason: "greeting".into()
            }
        );
        assert_eq!(gpt.translations(), 0);
        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn test_operator_can_force_past_precheck() {
        let gpt = Arc::new(
            ScriptedOracle::new("gpt")
                .classifying(["False <reason>"])
                .translating(["SHOW TABLES"])
                .voting(["yes yes"]),
        );
        let executor = Arc::new(ScriptedExecutor::default());
        let session = Session::new(orders_schema(), ConsensusMode::Base);

        let outcome = engine(&gpt, executor.clone())
            .handle(&session, "tables please", &AutoApprove)
            .await;

        assert!(outcome.is_success());
        assert_eq!(executor.statements(), vec!["SHOW TABLES".to_string()]);
    }
}
