use serde::Serialize;

use engine::{Balances, BalanceSnapshot, SettlementTransaction};

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub version: u64,
    pub balances: &'a Balances,
    pub plan: &'a [SettlementTransaction],
}

impl<'a> Report<'a> {
    pub fn new(snapshot: &'a BalanceSnapshot, plan: &'a [SettlementTransaction]) -> Self {
        Self {
            version: snapshot.version,
            balances: &snapshot.balances,
            plan,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let width = self
            .balances
            .iter()
            .map(|(user_id, _)| user_id.as_str().len())
            .max()
            .unwrap_or(0);

        out.push_str("Balances\n");
        if self.balances.is_empty() {
            out.push_str("  (no members)\n");
        }
        for (user_id, net) in self.balances.iter() {
            let sign = if net.is_positive() { "+" } else { "" };
            out.push_str(&format!("  {:<width$}  {sign}{net}\n", user_id.as_str()));
        }

        out.push_str("\nSettle up\n");
        if self.plan.is_empty() {
            out.push_str("  all settled\n");
        }
        for transaction in self.plan {
            out.push_str(&format!(
                "  {} -> {}: {}\n",
                transaction.from_user_id, transaction.to_user_id, transaction.amount
            ));
        }
        out
    }
}
