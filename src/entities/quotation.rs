use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quotation aggregate root.
///
/// Monetary totals are derived from the line set plus document charges and are
/// recomputed inside the same transaction as any line mutation. Customer fields
/// are a snapshot taken at creation time so later customer edits do not rewrite
/// quotation history.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quotations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Unique code in the form COT-{year}-{6-digit sequence}
    #[sea_orm(unique)]
    pub code: String,
    pub seller_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_document: String,
    #[sea_orm(nullable)]
    pub customer_email: Option<String>,
    #[sea_orm(nullable)]
    pub customer_phone: Option<String>,
    pub warehouse_id: Uuid,
    #[sea_orm(nullable)]
    pub coupon_id: Option<Uuid>,
    pub status: QuotationStatus,
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))")]
    pub exchange_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub discount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub coupon_discount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub shipping_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub packaging_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub assembly_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_margin: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub margin_percentage: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub commission_percentage: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub commission_amount: Decimal,
    pub commission_paid: bool,
    pub quotation_date: NaiveDate,
    pub valid_until: NaiveDate,
    #[sea_orm(nullable)]
    pub sent_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub sent_to_email: Option<String>,
    #[sea_orm(nullable)]
    pub converted_sale_id: Option<Uuid>,
    #[sea_orm(nullable)]
    pub converted_at: Option<DateTimeUtc>,
    #[sea_orm(nullable)]
    pub notes: Option<String>,
    pub is_archived: bool,
    pub created_at: DateTimeUtc,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeUtc>,
    /// Optimistic concurrency stamp; every mutation must bump it
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::quotation_detail::Entity")]
    Details,
    #[sea_orm(has_many = "super::quotation_status_history::Entity")]
    StatusHistory,
}

impl Related<super::quotation_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Details.def()
    }
}

impl Related<super::quotation_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Quotation lifecycle states
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuotationStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "expired")]
    Expired,
    #[sea_orm(string_value = "converted")]
    Converted,
}

impl QuotationStatus {
    /// Whether a transition from `self` to `next` is allowed at all.
    /// Guards that depend on aggregate state (line count, valid_until,
    /// conversion linkage) live in the service layer.
    pub fn can_transition_to(self, next: QuotationStatus) -> bool {
        use QuotationStatus::*;
        match (self, next) {
            (Draft, Sent) => true,
            (Sent, Accepted) | (Sent, Rejected) => true,
            // Anything short of conversion can expire once valid_until passes
            (Draft, Expired) | (Sent, Expired) | (Accepted, Expired) => true,
            // Conversion only leaves from accepted
            (Accepted, Converted) => true,
            _ => false,
        }
    }

    /// No outbound transitions are defined from these states.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Expired | Self::Converted)
    }
}

impl Model {
    /// Derived expiry view; the explicit `expired` transition is applied by a
    /// scheduled sweep, never as a side effect of reads.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.status != QuotationStatus::Converted && self.valid_until < today
    }

    /// Line items and document charges may only change while in draft.
    pub fn is_editable(&self) -> bool {
        self.status == QuotationStatus::Draft && !self.is_archived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_can_only_be_sent_or_expired() {
        use QuotationStatus::*;
        assert!(Draft.can_transition_to(Sent));
        assert!(Draft.can_transition_to(Expired));
        assert!(!Draft.can_transition_to(Accepted));
        assert!(!Draft.can_transition_to(Rejected));
        assert!(!Draft.can_transition_to(Converted));
    }

    #[test]
    fn sent_resolves_to_accepted_rejected_or_expired() {
        use QuotationStatus::*;
        assert!(Sent.can_transition_to(Accepted));
        assert!(Sent.can_transition_to(Rejected));
        assert!(Sent.can_transition_to(Expired));
        assert!(!Sent.can_transition_to(Draft));
        assert!(!Sent.can_transition_to(Converted));
    }

    #[test]
    fn only_accepted_converts() {
        use QuotationStatus::*;
        assert!(Accepted.can_transition_to(Converted));
        for from in [Draft, Sent, Rejected, Expired, Converted] {
            assert!(!from.can_transition_to(Converted), "{from} must not convert");
        }
    }

    #[test]
    fn terminal_states_have_no_outbound_edges() {
        use QuotationStatus::*;
        for from in [Rejected, Expired, Converted] {
            assert!(from.is_terminal());
            for to in [Draft, Sent, Accepted, Rejected, Expired, Converted] {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn same_status_transition_is_rejected() {
        use QuotationStatus::*;
        for status in [Draft, Sent, Accepted, Rejected, Expired, Converted] {
            assert!(!status.can_transition_to(status));
        }
    }
}
