use crate::application::checkout::UserAction;
use crate::error::{CheckoutError, Result};
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum ActionKind {
    SelectStore,
    AddItem,
    RemoveItem,
    Checkout,
    Login,
    Register,
    Logout,
    SessionChanged,
    Retry,
    Cancel,
}

/// One row of an action script: `action, arg1, arg2, arg3`.
#[derive(Debug, Deserialize)]
struct ActionRecord {
    action: ActionKind,
    arg1: Option<String>,
    arg2: Option<String>,
    arg3: Option<String>,
}

impl ActionRecord {
    fn arg<T: FromStr>(value: Option<String>, name: &str) -> Result<T> {
        let raw = value.ok_or_else(|| CheckoutError::ValidationError(format!("missing {name}")))?;
        raw.parse()
            .map_err(|_| CheckoutError::ValidationError(format!("invalid {name}: {raw}")))
    }
}

impl TryFrom<ActionRecord> for UserAction {
    type Error = CheckoutError;

    fn try_from(record: ActionRecord) -> Result<Self> {
        let action = match record.action {
            ActionKind::SelectStore => Self::SelectStore(ActionRecord::arg(record.arg1, "store id")?),
            ActionKind::AddItem => Self::AddItem(ActionRecord::arg(record.arg1, "menu id")?),
            ActionKind::RemoveItem => Self::RemoveItem(ActionRecord::arg(record.arg1, "line index")?),
            ActionKind::Checkout => Self::Checkout,
            ActionKind::Login => Self::Login {
                email: ActionRecord::arg(record.arg1, "email")?,
                password: ActionRecord::arg(record.arg2, "password")?,
            },
            ActionKind::Register => Self::Register {
                email: ActionRecord::arg(record.arg1, "email")?,
                password: ActionRecord::arg(record.arg2, "password")?,
                name: ActionRecord::arg(record.arg3, "name")?,
            },
            ActionKind::Logout => Self::Logout,
            ActionKind::SessionChanged => Self::SessionChanged,
            ActionKind::Retry => Self::Retry,
            ActionKind::Cancel => Self::Cancel,
        };
        Ok(action)
    }
}

/// Reads a scripted sequence of user actions from a CSV source.
///
/// Fields are trimmed and trailing argument columns may be omitted, so
/// `checkout` and `login, d@jwt.com, a` are both valid rows.
pub struct ActionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ActionReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily yields one action per row; a bad row yields an error and
    /// reading continues with the next.
    pub fn actions(self) -> impl Iterator<Item = Result<UserAction>> {
        self.reader
            .into_deserialize::<ActionRecord>()
            .map(|result| UserAction::try_from(result?))
    }
}
