use crate::admin::{AdminError, AdminResult};

use serde_json::json;
use serde_json::Value as JSValue;

/// The envelope printed for every command.
pub fn envelope(res: &AdminResult<JSValue>) -> JSValue {
    match res {
        Ok(data) => json!({"ok": true, "data": data}),
        Err(e) => failure(e),
    }
}

pub fn failure(e: &AdminError) -> JSValue {
    json!({"ok": false, "error": e.to_string()})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_shapes() {
        let ok: AdminResult<JSValue> = Ok(json!({"id": "1a"}));
        assert_eq!(envelope(&ok), json!({"ok": true, "data": {"id": "1a"}}));

        let err: AdminResult<JSValue> = Err(AdminError::EmptyRoster {
            anchor: "aba1".to_string(),
        });
        assert_eq!(
            envelope(&err),
            json!({"ok": false, "error": "The roster page lists no members under 'aba1'"})
        );
    }
}
