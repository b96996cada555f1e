//! CRM read tools: `getOpportunities` and `getSupportCases`.
//!
//! Both run a fixed query against the CRM database and return the full
//! result set in query order. An empty result is a success with a
//! "nothing found" message.

use std::sync::Arc;

use serde_json::Value;

use crate::db::RowStore;
use crate::tools::envelope::{HandlerFailure, ToolOutput};
use crate::tools::registry::{HandlerFuture, ToolHandler};
use crate::tools::schema::{Schema, ValidatedArguments};

const OPPORTUNITIES_SQL: &str = "
    SELECT row_to_json(r) FROM (
        SELECT
            opportunities.id AS opportunity_id,
            opportunities.status,
            opportunities.account_id,
            accounts.name AS account_name,
            opportunity_items.id AS item_id,
            opportunity_items.description,
            opportunity_items.amount,
            opportunity_items.year
        FROM opportunities
        LEFT JOIN opportunity_items
            ON opportunities.id = opportunity_items.opportunityid
        LEFT JOIN accounts
            ON opportunities.account_id = accounts.id
        WHERE opportunities.status = 'active'
    ) r
    ORDER BY r.opportunity_id, r.item_id";

const SUPPORT_CASES_SQL: &str = "
    SELECT row_to_json(r) FROM (
        SELECT
            support_cases.id AS case_id,
            support_cases.subject,
            support_cases.description,
            support_cases.status,
            support_cases.severity,
            support_cases.created_at,
            accounts.name AS account_name
        FROM support_cases
        LEFT JOIN accounts
            ON support_cases.account_id = accounts.id
        WHERE support_cases.account_id = '1'
    ) r
    ORDER BY r.created_at DESC";

/// A read-only tool backed by one fixed query.
pub struct CrmQueryTool<S> {
    store: Arc<S>,
    name: &'static str,
    description: &'static str,
    sql: &'static str,
    heading: &'static str,
    empty_message: &'static str,
    failure_context: &'static str,
}

impl<S: RowStore> CrmQueryTool<S> {
    /// `getOpportunities`: every item of every active opportunity.
    pub fn opportunities(store: Arc<S>) -> Self {
        Self {
            store,
            name: "getOpportunities",
            description: "Get the list of active opportunities from the CRM system. \
                          Returns every active opportunity item with its account name, \
                          ordered by opportunity id.",
            sql: OPPORTUNITIES_SQL,
            heading: "Active Opportunities:",
            empty_message: "No active opportunities found.",
            failure_context: "Error fetching opportunities",
        }
    }

    /// `getSupportCases`: support cases for account 1, newest first.
    pub fn support_cases(store: Arc<S>) -> Self {
        Self {
            store,
            name: "getSupportCases",
            description: "Get the list of support cases for account 1, most recent first.",
            sql: SUPPORT_CASES_SQL,
            heading: "Support Cases for account 1:",
            empty_message: "No support cases found for account 1.",
            failure_context: "Error fetching support cases",
        }
    }
}

impl<S: RowStore> ToolHandler for CrmQueryTool<S> {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn input_schema(&self) -> Schema {
        Schema::new()
    }

    fn execute(&self, _args: ValidatedArguments) -> HandlerFuture<'_> {
        Box::pin(async move {
            tracing::info!(tool = self.name, "Querying CRM");

            let rows = self
                .store
                .fetch_json_rows(self.sql)
                .await
                .map_err(|e| HandlerFailure::new(self.failure_context, e))?;

            if rows.is_empty() {
                return Ok(ToolOutput::empty(self.empty_message));
            }
            Ok(ToolOutput::json(self.heading, Value::Array(rows)))
        })
    }
}
