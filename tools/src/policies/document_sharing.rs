//! Demo policy engine for a workspace-style document-sharing tool suite (§4.8).
//!
//! A `share_file`/`append_to_file` call is only safe when everyone being
//! granted access already has access, i.e. the grantee set is no wider than
//! the file's current reader set; `send_message` additionally allows
//! recipients that come straight from the user even if the message body
//! itself is not yet readable by them.

use std::collections::BTreeSet;

use camel_core::value::collection;
use camel_core::Value;

use crate::policy::{CallArgs, PolicyDecision, SecurityPolicyEngine};

fn grantees(args: &CallArgs<'_>, field: &str) -> BTreeSet<String> {
    let Some(value) = args.get(field, usize::MAX) else {
        return BTreeSet::new();
    };
    match value.raw() {
        camel_core::Raw::List(_) | camel_core::Raw::Tuple(_) | camel_core::Raw::Set(_) => {
            collection::elements(value)
                .iter()
                .map(camel_core::value::string::native)
                .collect()
        }
        camel_core::Raw::Str(_) => BTreeSet::from([camel_core::value::string::native(value)]),
        _ => BTreeSet::new(),
    }
}

fn share_file_policy(args: &CallArgs<'_>) -> PolicyDecision {
    let Some(file) = args.get("file_id", 0).or_else(|| args.get("file", 0)) else {
        return PolicyDecision::Denied("missing file argument".to_string());
    };
    let grantees = grantees(args, "email");
    if grantees.is_empty() {
        return PolicyDecision::Denied("missing grantee argument".to_string());
    }
    if file.can_read(&grantees) {
        PolicyDecision::Allowed
    } else {
        PolicyDecision::Denied(
            "the grantee can't already read the file's contents".to_string(),
        )
    }
}

fn send_message_policy(args: &CallArgs<'_>) -> PolicyDecision {
    let Some(recipient) = args.get("recipient", 0) else {
        return PolicyDecision::Denied("missing recipient argument".to_string());
    };
    if recipient.is_trusted() {
        return PolicyDecision::Allowed;
    }
    let recipient_set = BTreeSet::from([camel_core::value::string::native(recipient)]);
    match args.get("body", 1) {
        Some(body) if body.can_read(&recipient_set) => PolicyDecision::Allowed,
        _ => PolicyDecision::Denied(
            "recipient is untrusted and cannot read the message body".to_string(),
        ),
    }
}

#[must_use]
pub fn engine() -> SecurityPolicyEngine {
    SecurityPolicyEngine::new("document-sharing")
        .with_no_side_effect_tools(["list_files", "read_file", "get_file_info"])
        .with_rule("share_file", Box::new(share_file_policy))
        .with_rule("append_to_file", Box::new(share_file_policy))
        .with_rule("send_message", Box::new(send_message_policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camel_types::{Capabilities, Readers};

    #[test]
    fn sharing_with_an_already_authorized_reader_is_allowed() {
        let engine = engine();
        let file = Value::str(
            "contents",
            Capabilities::with_readers(BTreeSet::new(), Readers::identified(["alice"])),
            vec![],
        );
        let grantee = Value::str("alice", Capabilities::camel(), vec![]);
        let keyword = vec![("file_id".to_string(), file), ("email".to_string(), grantee)];
        let args = CallArgs {
            positional: &[],
            keyword: &keyword,
        };
        assert!(engine.check("share_file", &args, &[]).is_allowed());
    }

    #[test]
    fn sharing_with_an_unauthorized_reader_is_denied() {
        let engine = engine();
        let file = Value::str(
            "contents",
            Capabilities::with_readers(BTreeSet::new(), Readers::identified(["alice"])),
            vec![],
        );
        let grantee = Value::str("mallory", Capabilities::camel(), vec![]);
        let keyword = vec![("file_id".to_string(), file), ("email".to_string(), grantee)];
        let args = CallArgs {
            positional: &[],
            keyword: &keyword,
        };
        assert!(!engine.check("share_file", &args, &[]).is_allowed());
    }
}
