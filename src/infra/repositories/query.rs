//! Dynamic query composition.
//!
//! Turns a [`QuerySpec`] into a SeaORM [`Select`]: joined relations,
//! predicate, ordering by a field *name*, then offset/limit. Field and
//! relation names are resolved against each entity's own registries
//! (the derived column enum and [`Navigation`]) instead of reflection.

use std::collections::HashSet;

use sea_orm::{
    Condition, EntityName, EntityTrait, IdenStatic, Iterable, JoinType, Order,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};

use crate::config::DEFAULT_PAGE_SIZE;
use crate::errors::{AppError, AppResult};

/// OFFSET is a signed 64-bit value in both Postgres and SQLite.
const MAX_ROW_OFFSET: u64 = i64::MAX as u64;

/// Relations an entity can eagerly join by name.
///
/// Only to-one relations are registered: joining a collection would
/// multiply the selected rows.
pub trait Navigation: EntityTrait {
    /// `name` arrives lowercased with separators stripped (`"account"`).
    fn navigation(name: &str) -> Option<Self::Relation>;
}

/// Entities deleted logically through a boolean flag.
pub trait SoftDelete: EntityTrait {
    fn deleted_flag() -> Self::Column;
}

/// Ad-hoc query over one entity collection.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub predicate: Option<Condition>,
    /// Field to order by; any of `diamond_code`, `diamondCode`, `DiamondCode`.
    pub order_by: Option<String>,
    /// `None` means ascending.
    pub is_ascending: Option<bool>,
    /// Relation names to join, e.g. `["account"]`.
    pub includes: Vec<String>,
    /// Zero-based
    pub page_index: u64,
    /// `0` disables paging
    pub page_size: u64,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            predicate: None,
            order_by: None,
            is_ascending: None,
            includes: Vec::new(),
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: Condition) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.order_by = Some(field.into());
        self.is_ascending = Some(ascending);
        self
    }

    pub fn include(mut self, relation: impl Into<String>) -> Self {
        self.includes.push(relation.into());
        self
    }

    pub fn page(mut self, page_index: u64, page_size: u64) -> Self {
        self.page_index = page_index;
        self.page_size = page_size;
        self
    }

    pub fn unpaged(mut self) -> Self {
        self.page_size = 0;
        self
    }

    pub fn ascending(&self) -> bool {
        self.is_ascending.unwrap_or(true)
    }

    pub fn is_paged(&self) -> bool {
        self.page_size > 0
    }

    pub fn offset(&self) -> u64 {
        page_offset(self.page_index, self.page_size)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub(crate) fn table_name<E: EntityTrait>() -> String {
    E::default().table_name().to_owned()
}

/// Row offset of a page, saturating at the largest offset SQL accepts.
pub fn page_offset(index: u64, size: u64) -> u64 {
    index.saturating_mul(size).min(MAX_ROW_OFFSET)
}

/// Resolve a field name to the entity's column.
///
/// # Errors
/// `ContractViolation` when the entity has no such field.
pub fn resolve_column<E: EntityTrait>(name: &str) -> AppResult<E::Column> {
    let wanted = normalize(name);
    E::Column::iter()
        .find(|column| normalize(column.as_str()) == wanted)
        .ok_or_else(|| {
            AppError::contract(format!(
                "{} has no field named '{}'",
                table_name::<E>(),
                name
            ))
        })
}

/// Resolve a relation name through the entity's [`Navigation`] registry.
///
/// # Errors
/// `ContractViolation` when the entity has no such relation.
pub fn resolve_navigation<E: Navigation>(name: &str) -> AppResult<E::Relation> {
    E::navigation(&normalize(name)).ok_or_else(|| {
        AppError::contract(format!(
            "{} has no relation named '{}'",
            table_name::<E>(),
            name
        ))
    })
}

/// Resolve relation names, dropping duplicates and blanks.
pub fn resolve_navigations<E, S>(names: &[S]) -> AppResult<Vec<E::Relation>>
where
    E: Navigation,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| name.as_ref().trim())
        .filter(|name| !name.is_empty() && seen.insert(normalize(name)))
        .map(resolve_navigation::<E>)
        .collect()
}

/// LEFT JOIN each relation once.
pub fn with_relations<E: EntityTrait>(mut select: Select<E>, relations: &[E::Relation]) -> Select<E> {
    let mut joined = HashSet::new();
    for relation in relations {
        if joined.insert(format!("{:?}", relation)) {
            select = select.join(JoinType::LeftJoin, relation.def());
        }
    }
    select
}

/// Order by a named field.
pub fn order_by_name<E: EntityTrait>(
    select: Select<E>,
    field: &str,
    ascending: bool,
) -> AppResult<Select<E>> {
    let column = resolve_column::<E>(field)?;
    let order = if ascending { Order::Asc } else { Order::Desc };
    Ok(select.order_by(column, order))
}

/// Build the select for `spec`: includes, predicate, order, then paging
/// when `paged` is set and the spec has a page size.
pub fn compose<E: Navigation>(spec: &QuerySpec, paged: bool) -> AppResult<Select<E>> {
    let relations = resolve_navigations::<E, _>(&spec.includes)?;
    let mut select = with_relations(E::find(), &relations);

    if let Some(predicate) = spec.predicate.clone() {
        select = select.filter(predicate);
    }

    if let Some(field) = spec.order_by.as_deref() {
        select = order_by_name(select, field, spec.ascending())?;
    }

    if paged && spec.is_paged() {
        select = select
            .offset(spec.offset())
            .limit(spec.page_size.min(MAX_ROW_OFFSET));
    }

    Ok(select)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::repositories::entities::{bid, transaction};
    use sea_orm::{ColumnTrait, DbBackend, QueryTrait};

    fn sql<E: EntityTrait>(select: Select<E>) -> String {
        select.build(DbBackend::Postgres).to_string()
    }

    #[test]
    fn column_names_resolve_in_any_case_style() {
        for name in ["diamond_code", "diamondCode", "DiamondCode", "DIAMOND_CODE"] {
            let column = resolve_column::<bid::Entity>(name).unwrap();
            assert_eq!(column.as_str(), "diamond_code");
        }
    }

    #[test]
    fn unknown_column_is_a_contract_violation() {
        let err = resolve_column::<bid::Entity>("carat").unwrap_err();
        assert!(matches!(err, AppError::ContractViolation(ref m) if m.contains("bids") && m.contains("carat")));
    }

    #[test]
    fn unknown_relation_is_a_contract_violation() {
        let err = resolve_navigation::<bid::Entity>("diamond").unwrap_err();
        assert!(matches!(err, AppError::ContractViolation(_)));
    }

    #[test]
    fn table_name_comes_from_the_entity() {
        assert_eq!(table_name::<bid::Entity>(), "bids");
        assert_eq!(table_name::<transaction::Entity>(), "transactions");
    }

    #[test]
    fn huge_pages_saturate_the_offset() {
        let spec = QuerySpec::new().page(u64::MAX, u64::MAX);
        assert_eq!(spec.offset(), i64::MAX as u64);
        assert_eq!(page_offset(3, 10), 30);
    }

    #[test]
    fn spec_defaults() {
        let spec = QuerySpec::new();
        assert!(spec.ascending());
        assert_eq!(spec.page_index, 0);
        assert_eq!(spec.page_size, DEFAULT_PAGE_SIZE);
        assert!(!QuerySpec::new().unpaged().is_paged());
    }

    #[test]
    fn compose_applies_order_and_paging() {
        let spec = QuerySpec::new().order_by("diamondCode", false).page(2, 10);
        let query = sql(compose::<bid::Entity>(&spec, true).unwrap());

        assert!(query.contains(r#"ORDER BY "bids"."diamond_code" DESC"#), "{query}");
        assert!(query.contains("LIMIT 10"), "{query}");
        assert!(query.contains("OFFSET 20"), "{query}");
    }

    #[test]
    fn compose_without_paging_has_no_limit() {
        let spec = QuerySpec::new().order_by("amount", true).page(3, 5);
        let query = sql(compose::<bid::Entity>(&spec, false).unwrap());

        assert!(query.contains(r#"ORDER BY "bids"."amount" ASC"#), "{query}");
        assert!(!query.contains("LIMIT"), "{query}");
        assert!(!query.contains("OFFSET"), "{query}");
    }

    #[test]
    fn zero_page_size_is_unpaged() {
        let spec = QuerySpec::new().page(4, 0);
        let query = sql(compose::<bid::Entity>(&spec, true).unwrap());
        assert!(!query.contains("LIMIT"), "{query}");
    }

    #[test]
    fn includes_are_joined_once() {
        let spec = QuerySpec::new()
            .include("account")
            .include("Account")
            .include("order");
        let query = sql(compose::<transaction::Entity>(&spec, true).unwrap());

        assert_eq!(query.matches(r#"LEFT JOIN "accounts""#).count(), 1, "{query}");
        assert_eq!(query.matches(r#"LEFT JOIN "orders""#).count(), 1, "{query}");
    }

    #[test]
    fn predicate_is_applied() {
        let spec = QuerySpec::new().filter(Condition::all().add(bid::Column::Status.eq("active")));
        let query = sql(compose::<bid::Entity>(&spec, true).unwrap());
        assert!(query.contains(r#"WHERE "bids"."status" = 'active'"#), "{query}");
    }

    #[test]
    fn bad_order_field_fails_composition() {
        let spec = QuerySpec::new().order_by("nope", true);
        assert!(matches!(
            compose::<bid::Entity>(&spec, true),
            Err(AppError::ContractViolation(_))
        ));
    }
}
