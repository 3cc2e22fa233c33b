//! Campaign performance

use crate::engine::{MaterializedResult, QueryError, QueryPlan};
use crate::plan::{col, lit, AggregateExpr, Expr, SortKey};
use super::columns::{CAMPAIGN_ID, CLICKED, DELIVERED, EVENT_TYPE, SUCCESS_RATE, TEMPLATE_ID};
use super::datasets::CAMPAIGN_METRICS;
use super::{ProfileAggregator, ProfileError};

const CLICKED_EVENT: &str = "clicked";
const DELIVERED_EVENT: &str = "delivered";

impl ProfileAggregator {
    /// Message templates ranked by click-through.
    ///
    /// `success_rate = clicked / delivered`, and exactly 0 for templates with
    /// no deliveries. Ordered by rate descending, then template id ascending.
    pub fn campaign_leaderboard_plan(&self, top_n: usize) -> Result<QueryPlan, QueryError> {
        let engine = self.engine();
        let events = engine.scan(CAMPAIGN_METRICS, None)?;
        let counts = engine.aggregate(
            &events,
            &[TEMPLATE_ID],
            vec![
                AggregateExpr::count_where(col(EVENT_TYPE).eq(lit(CLICKED_EVENT)), CLICKED),
                AggregateExpr::count_where(col(EVENT_TYPE).eq(lit(DELIVERED_EVENT)), DELIVERED),
            ],
        )?;
        let success_rate = Expr::Case {
            when_then: vec![(col(DELIVERED).eq(lit(0i64)), lit(0.0))],
            else_result: Some(Box::new(col(CLICKED).div(col(DELIVERED)))),
        };
        let rated = engine.with_derived(&counts, SUCCESS_RATE, success_rate)?;
        let ranked = engine.sort(
            &rated,
            vec![SortKey::desc(SUCCESS_RATE), SortKey::asc(TEMPLATE_ID)],
        )?;
        Ok(engine.limit(&ranked, top_n))
    }

    pub fn campaign_leaderboard(&self, top_n: usize) -> Result<MaterializedResult, ProfileError> {
        let plan = self.campaign_leaderboard_plan(top_n)?;
        Ok(self.engine().materialize(&plan)?)
    }

    /// Raw events for one campaign
    pub fn campaign_events(&self, campaign_id: &str) -> Result<MaterializedResult, ProfileError> {
        let plan = self
            .engine()
            .scan(CAMPAIGN_METRICS, Some(col(CAMPAIGN_ID).eq(lit(campaign_id))))?;
        Ok(self.engine().materialize(&plan)?)
    }
}
