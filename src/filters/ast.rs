use chrono::NaiveDate;

/// What a `has:` term asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Any attached file
    Attachment,
    /// An image, video or audio attachment
    Media,
}

/// One `field:value` term, with the value already parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Sender contains the needle, case-insensitively. Stored lowercased.
    From(String),
    /// Sent on or after the day
    Since(NaiveDate),
    /// Sent on or before the day, inclusive
    Until(NaiveDate),
    Has(Presence),
}

impl Condition {
    /// Field name as written in a query
    pub fn field(&self) -> &'static str {
        match self {
            Self::From(_) => "from",
            Self::Since(_) => "since",
            Self::Until(_) => "until",
            Self::Has(_) => "has",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    And,
    Or,
}

impl Join {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// A parsed filter query.
///
/// Conditions fold left to right with no precedence: each one after the first is
/// joined to the result of everything before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterExpr {
    head: Option<Condition>,
    rest: Vec<(Join, Condition)>,
}

impl FilterExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition. The join is ignored for the first one.
    pub fn push(&mut self, join: Join, condition: Condition) {
        if self.head.is_none() {
            self.head = Some(condition);
        } else {
            self.rest.push((join, condition));
        }
    }

    pub fn head(&self) -> Option<&Condition> {
        self.head.as_ref()
    }

    pub fn rest(&self) -> &[(Join, Condition)] {
        &self.rest
    }

    pub fn len(&self) -> usize {
        self.head.iter().count() + self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn joins(&self) -> Vec<Join> {
        self.rest.iter().map(|(join, _)| *join).collect()
    }
}
