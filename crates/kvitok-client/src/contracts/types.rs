use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    Created,
    DuplicateExternalId,
    DuplicateFiscalTriple,
    ItemsAttached,
}

impl IngestOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::DuplicateExternalId => "duplicate_external_id",
            Self::DuplicateFiscalTriple => "duplicate_fiscal_triple",
            Self::ItemsAttached => "items_attached",
        }
    }

    pub fn is_duplicate(self) -> bool {
        matches!(
            self,
            Self::DuplicateExternalId | Self::DuplicateFiscalTriple
        )
    }
}

/// A line item that could not be stored, with the path of the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemIssue {
    pub index: usize,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub receipt_id: String,
    pub external_id: String,
    pub outcome: IngestOutcome,
    pub items_processed: i64,
    pub items_in_source: i64,
    pub item_issues: Vec<ItemIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestData {
    pub user_id: String,
    pub source_used: String,
    pub source_ref: Option<String>,
    pub receipts: Vec<IngestReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub user_id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub bot_identity: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopRecord {
    pub shop_id: String,
    pub legal_name: String,
    pub inn: Option<String>,
    pub retail_name: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub is_favorite: bool,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopListData {
    pub favorite_only: bool,
    pub shops: Vec<ShopRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopResolveData {
    pub trade_name: String,
    pub address: Option<String>,
    pub shop_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopDeleteData {
    pub shop_id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternRecord {
    pub pattern_id: String,
    pub shop_id: String,
    pub pattern_type: String,
    pub pattern_value: String,
    pub is_regex: bool,
    pub priority: i64,
    pub regex_valid: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternListData {
    pub patterns: Vec<PatternRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternRemoveData {
    pub pattern_id: String,
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptSummary {
    pub receipt_id: String,
    pub external_id: String,
    pub date_time: String,
    pub total_sum: i64,
    pub shop_id: String,
    pub shop_name: String,
    pub items_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptListData {
    pub skip: i64,
    pub limit: i64,
    pub receipts: Vec<ReceiptSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashierRecord {
    pub cashier_id: String,
    pub name: Option<String>,
    pub inn: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptItemRecord {
    pub item_id: String,
    pub position: i64,
    pub name: String,
    pub price: i64,
    pub quantity: f64,
    pub sum: i64,
    pub measure: String,
    pub product_type: Option<i64>,
    pub gtin: Option<String>,
    pub raw_product_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptDetail {
    pub receipt_id: String,
    pub external_id: String,
    pub date_time: String,
    pub total_sum: i64,
    pub cash_total_sum: i64,
    pub ecash_total_sum: i64,
    pub credit_sum: i64,
    pub prepaid_sum: i64,
    pub provision_sum: i64,
    pub fiscal_drive_number: Option<String>,
    pub fiscal_document_number: Option<i64>,
    pub fiscal_sign: Option<String>,
    pub shift_number: Option<i64>,
    pub operation_type: Option<i64>,
    pub kkt_reg_id: Option<String>,
    pub nds10: Option<i64>,
    pub nds18: Option<i64>,
    pub shop: ShopRecord,
    pub cashier: Option<CashierRecord>,
    pub items: Vec<ReceiptItemRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptDeleteData {
    pub receipt_id: String,
    pub deleted: bool,
    pub items_deleted: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TotalSpending {
    pub total_sum: i64,
    pub cash_total_sum: i64,
    pub ecash_total_sum: i64,
    pub credit_sum: i64,
    pub prepaid_sum: i64,
    pub receipts_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRow {
    pub month: u32,
    pub total_sum: i64,
    pub cash_total_sum: i64,
    pub ecash_total_sum: i64,
    pub receipts_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyDynamicsData {
    pub year: i32,
    pub months: Vec<MonthlyRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProductRow {
    pub name: String,
    pub measure: String,
    pub total_sum: i64,
    pub total_quantity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopProductsData {
    pub months_back: Option<u32>,
    pub limit: i64,
    pub products: Vec<TopProductRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopSpendingRow {
    pub shop_id: String,
    pub retail_name: Option<String>,
    pub legal_name: String,
    pub inn: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub is_favorite: bool,
    pub total_amount: i64,
    pub receipts_count: i64,
    pub receipt_avg: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopSpendingData {
    pub sort_by: String,
    pub descending: bool,
    pub offset: i64,
    pub limit: Option<i64>,
    pub shops: Vec<ShopSpendingRow>,
}
