//! Header-to-role resolution.
//!
//! Shop exports name their columns loosely and bilingually ("产品", "商品名称",
//! "Product", "品名"...). Instead of requiring an exact schema, each header is
//! matched case-insensitively against a fixed synonym table and assigned a
//! semantic [`Role`]. The first header from the left that matches a role wins
//! it, and a header claimed by one role is never considered for another, so
//! overlapping synonym sets cannot silently reassign columns.

use std::fmt;

use serde::Serialize;

use crate::error::AnalyzeError;

/// Semantic meaning assigned to a spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Product,
    Size,
    Quantity,
    Amount,
    Shipping,
    Date,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Product,
        Role::Size,
        Role::Quantity,
        Role::Amount,
        Role::Shipping,
        Role::Date,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Role::Product => "product",
            Role::Size => "size",
            Role::Quantity => "quantity",
            Role::Amount => "amount",
            Role::Shipping => "shipping",
            Role::Date => "date",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Synonyms per role, in claim-priority order. A header matching several
/// roles is claimed by the earliest entry here.
const ROLE_SYNONYMS: &[(Role, &[&str])] = &[
    (
        Role::Product,
        &["产品", "品名", "商品", "货品", "名称", "product", "item"],
    ),
    (Role::Size, &["尺寸", "规格", "size"]),
    (Role::Quantity, &["数量", "件数", "销量", "quantity", "qty"]),
    (Role::Amount, &["金额", "销售额", "收入", "amount", "sales"]),
    (Role::Shipping, &["运费", "邮费", "快递费", "shipping"]),
    (Role::Date, &["日期", "时间", "date", "月份", "month"]),
];

/// Resolved mapping from role to zero-based column index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleMap {
    pub product: Option<usize>,
    pub size: Option<usize>,
    pub quantity: Option<usize>,
    pub amount: Option<usize>,
    pub shipping: Option<usize>,
    pub date: Option<usize>,
}

impl RoleMap {
    pub fn get(&self, role: Role) -> Option<usize> {
        match role {
            Role::Product => self.product,
            Role::Size => self.size,
            Role::Quantity => self.quantity,
            Role::Amount => self.amount,
            Role::Shipping => self.shipping,
            Role::Date => self.date,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<usize> {
        match role {
            Role::Product => &mut self.product,
            Role::Size => &mut self.size,
            Role::Quantity => &mut self.quantity,
            Role::Amount => &mut self.amount,
            Role::Shipping => &mut self.shipping,
            Role::Date => &mut self.date,
        }
    }

    /// Required roles that failed to resolve: `product` always, and both
    /// `quantity` and `amount` when neither numeric column was found.
    pub fn missing_required(&self) -> Vec<Role> {
        let mut missing = Vec::new();
        if self.product.is_none() {
            missing.push(Role::Product);
        }
        if self.quantity.is_none() && self.amount.is_none() {
            missing.push(Role::Quantity);
            missing.push(Role::Amount);
        }
        missing
    }
}

/// Maps headers to roles without enforcing that required roles resolved.
/// Used by the `roles` command to show partial mappings for diagnosis.
pub fn resolve_partial(headers: &[String]) -> RoleMap {
    let mut map = RoleMap::default();
    for (index, header) in headers.iter().enumerate() {
        let lowered = header.trim().to_lowercase();
        if lowered.is_empty() {
            continue;
        }
        for (role, synonyms) in ROLE_SYNONYMS {
            if map.get(*role).is_some() {
                continue;
            }
            if synonyms.iter().any(|synonym| lowered.contains(synonym)) {
                *map.slot_mut(*role) = Some(index);
                break;
            }
        }
    }
    map
}

/// Maps headers to roles, failing when the dataset is unanalyzable
/// (no product column, or neither quantity nor amount).
pub fn resolve(headers: &[String]) -> Result<RoleMap, AnalyzeError> {
    let map = resolve_partial(headers);
    let missing = map.missing_required();
    if missing.is_empty() {
        Ok(map)
    } else {
        Err(AnalyzeError::SchemaUnrecognized { missing })
    }
}
