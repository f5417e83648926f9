//! Demo policy engine for a banking-style tool suite (§4.8).
//!
//! Grounded on the source project's `banking.py`: money movement is allowed
//! only when the recipient is a trusted value (came from the user, not from
//! some webpage the agent read) and every other argument of the transfer is
//! readable by that recipient — otherwise the transfer would leak private
//! data to whoever receives it.

use std::collections::BTreeSet;

use crate::policy::{CallArgs, PolicyDecision, SecurityPolicyEngine};

fn transfer_policy(args: &CallArgs<'_>) -> PolicyDecision {
    let Some(recipient) = args.get("recipient", 0) else {
        return PolicyDecision::Denied("missing recipient argument".to_string());
    };
    if !recipient.is_trusted() {
        return PolicyDecision::Denied("the recipient does not come directly from the user".to_string());
    }
    let camel_core::Raw::Str(_) = recipient.raw() else {
        return PolicyDecision::Denied("recipient must be a string".to_string());
    };
    let recipient_set = BTreeSet::from([camel_core::value::string::native(recipient)]);

    for field in ["subject", "amount", "date"] {
        if let Some(value) = args.get(field, usize::MAX) {
            if !value.can_read(&recipient_set) {
                return PolicyDecision::Denied(format!(
                    "the recipient can't read the transaction {field}"
                ));
            }
        }
    }
    PolicyDecision::Allowed
}

fn update_password_policy(args: &CallArgs<'_>) -> PolicyDecision {
    match args.get("password", 0) {
        Some(password) if password.is_trusted() => PolicyDecision::Allowed,
        _ => PolicyDecision::Denied("the password does not come from the user".to_string()),
    }
}

fn update_user_info_policy(args: &CallArgs<'_>) -> PolicyDecision {
    let all_trusted = args.positional.iter().all(camel_core::Value::is_trusted)
        && args.keyword.iter().all(|(_, v)| v.is_trusted());
    if all_trusted {
        PolicyDecision::Allowed
    } else {
        PolicyDecision::Denied("the user information does not come from the user".to_string())
    }
}

#[must_use]
pub fn engine() -> SecurityPolicyEngine {
    SecurityPolicyEngine::new("banking")
        .with_no_side_effect_tools([
            "get_iban",
            "get_balance",
            "get_most_recent_transactions",
            "get_scheduled_transactions",
            "read_file",
            "get_user_info",
        ])
        .with_rule("send_money", Box::new(transfer_policy))
        .with_rule("schedule_transaction", Box::new(transfer_policy))
        .with_rule("update_password", Box::new(update_password_policy))
        .with_rule("update_user_info", Box::new(update_user_info_policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camel_core::Value;
    use camel_types::{Capabilities, Readers};

    #[test]
    fn untrusted_recipient_is_denied() {
        let engine = engine();
        let recipient = Value::str(
            "attacker@example.com",
            Capabilities::with_readers(BTreeSet::new(), Readers::Public),
            vec![],
        );
        let args = CallArgs {
            positional: &[],
            keyword: &[("recipient".to_string(), recipient)],
        };
        assert!(!engine.check("send_money", &args, &[]).is_allowed());
    }

    #[test]
    fn trusted_recipient_with_readable_fields_is_allowed() {
        let engine = engine();
        let recipient = Value::str("bob", Capabilities::camel(), vec![]);
        let subject = Value::str("rent", Capabilities::camel(), vec![]);
        let amount = Value::int(100, Capabilities::camel(), vec![]);
        let date = Value::str("2026-01-01", Capabilities::camel(), vec![]);
        let args = CallArgs {
            positional: &[],
            keyword: &[
                ("recipient".to_string(), recipient),
                ("subject".to_string(), subject),
                ("amount".to_string(), amount),
                ("date".to_string(), date),
            ],
        };
        assert!(engine.check("send_money", &args, &[]).is_allowed());
    }
}
