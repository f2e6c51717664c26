//! Core types for the ledger
//!
//! Flags are a two-valued domain. Their persisted spelling lives in
//! [`FlagVocabulary`] and never leaks into comparisons elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticket code printed and QR-encoded on a physical ticket
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketCode(String);

impl TicketCode {
    /// Create new ticket code (surrounding whitespace is dropped)
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let trimmed = code.trim();
        if trimmed.len() == code.len() {
            Self(code)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the code has no characters
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TicketCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Completion state of one distribution category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagState {
    /// Not yet distributed
    #[serde(alias = "pending", alias = "Non", alias = "non")]
    Pending,
    /// Distributed
    #[serde(alias = "done", alias = "Oui", alias = "oui")]
    Done,
}

impl FlagState {
    /// True for `Done`
    pub fn is_done(self) -> bool {
        self == FlagState::Done
    }
}

impl fmt::Display for FlagState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagState::Pending => write!(f, "Pending"),
            FlagState::Done => write!(f, "Done"),
        }
    }
}

/// Persisted spelling of [`FlagState`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagVocabulary {
    /// Cell value meaning `Done`
    pub done: String,
    /// Cell value written for `Pending`
    pub pending: String,
}

impl Default for FlagVocabulary {
    fn default() -> Self {
        Self {
            done: "Oui".to_string(),
            pending: "Non".to_string(),
        }
    }
}

impl FlagVocabulary {
    /// Decode a cell. Anything other than the done literal is `Pending`.
    pub fn parse(&self, cell: &str) -> FlagState {
        if cell.trim().eq_ignore_ascii_case(self.done.trim()) {
            FlagState::Done
        } else {
            FlagState::Pending
        }
    }

    /// Encode a state as a cell
    pub fn render(&self, state: FlagState) -> &str {
        match state {
            FlagState::Done => &self.done,
            FlagState::Pending => &self.pending,
        }
    }
}

/// Distribution category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    /// Token handed out
    #[serde(rename = "tokenDistributed")]
    Token,
    /// Non-food items
    Nfi,
    /// Tools
    Tools,
    /// Seed
    Seed,
}

impl Category {
    /// All categories, in column order
    pub const ALL: [Category; 4] = [Category::Token, Category::Nfi, Category::Tools, Category::Seed];

    /// Stable name used in logs and responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Token => "tokenDistributed",
            Category::Nfi => "nfi",
            Category::Tools => "tools",
            Category::Seed => "seed",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Completion state of all four categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionFlags {
    /// Token
    pub token_distributed: FlagState,
    /// Non-food items
    pub nfi: FlagState,
    /// Tools
    pub tools: FlagState,
    /// Seed
    pub seed: FlagState,
}

impl Default for DistributionFlags {
    fn default() -> Self {
        Self {
            token_distributed: FlagState::Pending,
            nfi: FlagState::Pending,
            tools: FlagState::Pending,
            seed: FlagState::Pending,
        }
    }
}

impl DistributionFlags {
    /// State of one category
    pub fn get(&self, category: Category) -> FlagState {
        match category {
            Category::Token => self.token_distributed,
            Category::Nfi => self.nfi,
            Category::Tools => self.tools,
            Category::Seed => self.seed,
        }
    }

    /// Set one category
    pub fn set(&mut self, category: Category, state: FlagState) {
        match category {
            Category::Token => self.token_distributed = state,
            Category::Nfi => self.nfi = state,
            Category::Tools => self.tools = state,
            Category::Seed => self.seed = state,
        }
    }

    /// A record is fully served iff all four flags are `Done`
    pub fn is_fully_served(&self) -> bool {
        Category::ALL.iter().all(|c| self.get(*c).is_done())
    }

    /// Categories already `Done`
    pub fn done_categories(&self) -> Vec<Category> {
        Category::ALL
            .iter()
            .copied()
            .filter(|c| self.get(*c).is_done())
            .collect()
    }
}

/// Partial update: absent categories are left untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRequest {
    /// Token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_distributed: Option<FlagState>,
    /// Non-food items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nfi: Option<FlagState>,
    /// Tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<FlagState>,
    /// Seed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<FlagState>,
}

impl DistributionRequest {
    /// Request a single category
    pub fn with(mut self, category: Category, state: FlagState) -> Self {
        match category {
            Category::Token => self.token_distributed = Some(state),
            Category::Nfi => self.nfi = Some(state),
            Category::Tools => self.tools = Some(state),
            Category::Seed => self.seed = Some(state),
        }
        self
    }

    /// Request `Done` for every given category
    pub fn done(categories: &[Category]) -> Self {
        categories
            .iter()
            .fold(Self::default(), |req, c| req.with(*c, FlagState::Done))
    }

    /// Requested value for a category
    pub fn get(&self, category: Category) -> Option<FlagState> {
        match category {
            Category::Token => self.token_distributed,
            Category::Nfi => self.nfi,
            Category::Tools => self.tools,
            Category::Seed => self.seed,
        }
    }

    /// Requested entries, in column order
    pub fn entries(&self) -> impl Iterator<Item = (Category, FlagState)> + '_ {
        Category::ALL
            .iter()
            .filter_map(move |c| self.get(*c).map(|s| (*c, s)))
    }

    /// True if no category is requested
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

/// Subset of a request that is actually applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveUpdate {
    changes: Vec<(Category, FlagState)>,
}

impl EffectiveUpdate {
    /// Compute the update. A category is applied only if it is not already
    /// `Done` and the requested value differs from the current one.
    pub fn compute(current: &DistributionFlags, requested: &DistributionRequest) -> Self {
        let changes = requested
            .entries()
            .filter(|(category, state)| {
                let now = current.get(*category);
                !now.is_done() && now != *state
            })
            .collect();
        Self { changes }
    }

    /// Apply to a set of flags
    pub fn apply_to(&self, flags: &mut DistributionFlags) {
        for (category, state) in &self.changes {
            flags.set(*category, *state);
        }
    }

    /// Changed categories
    pub fn categories(&self) -> Vec<Category> {
        self.changes.iter().map(|(c, _)| *c).collect()
    }

    /// Changes in column order
    pub fn changes(&self) -> &[(Category, FlagState)] {
        &self.changes
    }

    /// True if nothing would change
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Typed view of one beneficiary row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryRecord {
    /// Unique ticket code
    pub ticket_code: TicketCode,
    /// Display name
    pub name: String,
    /// Age (descriptive)
    pub age: String,
    /// Partner info (descriptive)
    pub partner_info: String,
    /// Card info (descriptive)
    pub card_info: String,
    /// Distribution flags
    pub flags: DistributionFlags,
}

impl BeneficiaryRecord {
    /// Descriptive info by priority: partner, then card, then age
    pub fn info(&self) -> Option<TicketInfo> {
        [
            (InfoKind::Partner, &self.partner_info),
            (InfoKind::Card, &self.card_info),
            (InfoKind::Age, &self.age),
        ]
        .into_iter()
        .find(|(_, value)| !value.trim().is_empty())
        .map(|(kind, value)| TicketInfo {
            kind,
            info: value.clone(),
        })
    }
}

/// Which descriptive field was returned by a ticket check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoKind {
    /// Partner column
    Partner,
    /// Card column
    Card,
    /// Age column
    Age,
}

impl fmt::Display for InfoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoKind::Partner => write!(f, "Partner"),
            InfoKind::Card => write!(f, "Card"),
            InfoKind::Age => write!(f, "Age"),
        }
    }
}

/// Result of a ticket check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketInfo {
    /// Field chosen
    pub kind: InfoKind,
    /// Field value, verbatim
    pub info: String,
}

/// Confirmation of a successful distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionReceipt {
    /// Updated ticket
    pub ticket_code: TicketCode,
    /// Categories changed by this call
    pub applied: Vec<Category>,
    /// Flags after the update
    pub flags: DistributionFlags,
    /// Human-readable confirmation
    pub message: String,
    /// When the write completed
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate counts over the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Number of records
    pub records: usize,
    /// Records with all four flags `Done`
    pub fully_served: usize,
    /// Records with the token flag `Done`
    pub token_distributed: usize,
    /// Records with the NFI flag `Done`
    pub nfi: usize,
    /// Records with the tools flag `Done`
    pub tools: usize,
    /// Records with the seed flag `Done`
    pub seed: usize,
}

impl LedgerSummary {
    /// Tally a record
    pub fn add(&mut self, flags: &DistributionFlags) {
        self.records += 1;
        if flags.is_fully_served() {
            self.fully_served += 1;
        }
        for category in flags.done_categories() {
            match category {
                Category::Token => self.token_distributed += 1,
                Category::Nfi => self.nfi += 1,
                Category::Tools => self.tools += 1,
                Category::Seed => self.seed += 1,
            }
        }
    }
}
