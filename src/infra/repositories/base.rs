//! Generic repository over any SeaORM entity.
//!
//! Reads go straight to the connection. Writes are staged on the shared
//! [`DbContext`] and only hit the database on `save_changes`, except for
//! [`GenericRepository::stage_update_and_commit`].

use std::marker::PhantomData;
use std::sync::Arc;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, PrimaryKeyTrait, QueryFilter, QuerySelect, Related, Select,
    UpdateMany, Value,
};

use super::query::{self, Navigation, QuerySpec, SoftDelete};
use crate::config::LEGACY_DEFAULT_PAGE_SIZE;
use crate::errors::{AppError, AppResult};
use crate::infra::context::DbContext;

/// Ordering applied by the legacy [`GenericRepository::get`].
pub type OrderTransform<E> = Box<dyn FnOnce(Select<E>) -> Select<E> + Send>;

/// Repository bound to one entity type.
pub struct GenericRepository<E: EntityTrait> {
    context: Arc<DbContext>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: EntityTrait> Clone for GenericRepository<E> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            _entity: PhantomData,
        }
    }
}

impl<E> GenericRepository<E>
where
    E: Navigation,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelBehavior + Send + 'static,
{
    pub fn new(context: Arc<DbContext>) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.context.connection()
    }

    pub fn context(&self) -> &Arc<DbContext> {
        &self.context
    }

    /// Every record, soft-deleted ones included.
    pub async fn get_all(&self) -> AppResult<Vec<E::Model>> {
        Ok(E::find().all(self.db()).await?)
    }

    /// Record by primary key. `includes` are joined so a caller-added
    /// filter can reach them; their columns are not returned. Use
    /// [`get_by_id_with_related`](Self::get_by_id_with_related) to load
    /// the related row itself.
    pub async fn get_by_id<K>(&self, id: K, includes: &[E::Relation]) -> AppResult<Option<E::Model>>
    where
        K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        let select = query::with_relations(E::find_by_id(id), includes);
        Ok(select.one(self.db()).await?)
    }

    /// Record by primary key together with its related `R` row.
    pub async fn get_by_id_with_related<K, R>(
        &self,
        id: K,
    ) -> AppResult<Option<(E::Model, Option<R::Model>)>>
    where
        K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
        R: EntityTrait,
        E: Related<R>,
    {
        Ok(E::find_by_id(id)
            .find_also_related(R::default())
            .one(self.db())
            .await?)
    }

    /// Stage an insert.
    pub async fn add(&self, model: E::Model) -> E::Model {
        self.stage_insert(model.clone().into_active_model()).await;
        model
    }

    /// Stage an insert that turns into an update of the row it collides
    /// with. On conflict the stored row keeps its own primary key.
    pub async fn add_or_update(&self, model: E::Model, on_conflict: OnConflict) -> E::Model {
        let active = model.clone().into_active_model().reset_all();
        self.context
            .stage(move |txn| {
                Box::pin(async move {
                    E::insert(active)
                        .on_conflict(on_conflict)
                        .exec_without_returning(txn)
                        .await
                        .map(|_| ())
                })
            })
            .await;
        model
    }

    pub async fn add_range(&self, models: Vec<E::Model>) {
        for model in models {
            self.stage_insert(model.into_active_model()).await;
        }
    }

    /// Stage an update of every column. Nothing is written until
    /// `save_changes`.
    pub async fn stage_update(&self, model: E::Model) {
        self.stage_active_update(model.into_active_model().reset_all())
            .await;
    }

    pub async fn update_range(&self, models: Vec<E::Model>) {
        for model in models {
            self.stage_update(model).await;
        }
    }

    /// Stage an update, then commit it together with everything else
    /// already staged on the context.
    pub async fn stage_update_and_commit(&self, model: E::Model) -> AppResult<()> {
        self.stage_update(model).await;
        self.context.save_changes().await?;
        Ok(())
    }

    /// Stage a conditional update that must hit exactly one row.
    ///
    /// The condition is evaluated inside the commit transaction. When it
    /// matches no row, `save_changes` fails with `DbErr::RecordNotUpdated`
    /// and nothing staged is written.
    pub async fn stage_guarded_update(&self, update: UpdateMany<E>) {
        self.context
            .stage(move |txn| {
                Box::pin(async move {
                    match update.exec(txn).await {
                        Ok(result) if result.rows_affected == 1 => Ok(()),
                        Ok(_) => Err(DbErr::RecordNotUpdated),
                        Err(e) => Err(e),
                    }
                })
            })
            .await;
    }

    /// Stage a physical delete.
    pub async fn remove(&self, model: E::Model) -> E::Model {
        let active = model.clone().into_active_model();
        self.context
            .stage(move |txn| {
                Box::pin(async move { E::delete(active).exec(txn).await.map(|_| ()) })
            })
            .await;
        model
    }

    /// Unfiltered view with `includes` joined. Joins only widen what a
    /// filter can see; the select still yields `E` models alone.
    pub fn find_all(&self, includes: &[E::Relation]) -> Select<E> {
        query::with_relations(E::find(), includes)
    }

    /// Includes, predicate, order by name, then `page_index * page_size`
    /// offset and `page_size` limit. A zero page size leaves it unpaged.
    pub fn filter_all(&self, spec: &QuerySpec) -> AppResult<Select<E>> {
        query::compose::<E>(spec, true)
    }

    /// [`filter_all`](Self::filter_all) without offset and limit.
    pub fn get_all_without_paging(&self, spec: &QuerySpec) -> AppResult<Select<E>> {
        query::compose::<E>(spec, false)
    }

    /// Rows matching `spec`, ignoring its paging.
    pub async fn count(&self, spec: &QuerySpec) -> AppResult<u64> {
        Ok(self.get_all_without_paging(spec)?.count(self.db()).await?)
    }

    pub fn filter_by_expression<S: AsRef<str>>(
        &self,
        predicate: Condition,
        includes: &[S],
    ) -> AppResult<Select<E>> {
        let relations = query::resolve_navigations::<E, S>(includes)?;
        Ok(query::with_relations(E::find(), &relations).filter(predicate))
    }

    /// At most one match expected.
    ///
    /// # Errors
    /// `ContractViolation` if more than one record matches.
    pub async fn find_single(
        &self,
        predicate: Option<Condition>,
        includes: &[E::Relation],
    ) -> AppResult<Option<E::Model>> {
        let mut select = self.find_all(includes);
        if let Some(predicate) = predicate {
            select = select.filter(predicate);
        }

        let mut found = select.limit(2).all(self.db()).await?;
        match found.len() {
            0 | 1 => Ok(found.pop()),
            _ => Err(AppError::contract(format!(
                "expected at most one {} row, found several",
                query::table_name::<E>()
            ))),
        }
    }

    /// Legacy paging entry point.
    ///
    /// `page_index` is 1-based; a missing or non-positive size becomes
    /// [`LEGACY_DEFAULT_PAGE_SIZE`]. Paging only applies when both are given.
    #[deprecated(note = "use `filter_all` with a zero-based `QuerySpec`")]
    pub async fn get(
        &self,
        filter: Option<Condition>,
        order: Option<OrderTransform<E>>,
        include_properties: &str,
        page_index: Option<i64>,
        page_size: Option<i64>,
    ) -> AppResult<Vec<E::Model>> {
        let mut select = E::find();
        if let Some(filter) = filter {
            select = select.filter(filter);
        }

        let names: Vec<&str> = include_properties.split(',').collect();
        let relations = query::resolve_navigations::<E, _>(&names)?;
        select = query::with_relations(select, &relations);

        if let Some(order) = order {
            select = order(select);
        }

        if let (Some(index), Some(size)) = (page_index, page_size) {
            let index = if index > 0 { (index - 1) as u64 } else { 0 };
            let size = if size > 0 {
                size as u64
            } else {
                LEGACY_DEFAULT_PAGE_SIZE
            };
            select = select.offset(query::page_offset(index, size)).limit(size);
        }

        Ok(select.all(self.db()).await?)
    }

    async fn stage_insert(&self, active: E::ActiveModel) {
        let active = active.reset_all();
        self.context
            .stage(move |txn| {
                Box::pin(async move {
                    E::insert(active)
                        .exec_without_returning(txn)
                        .await
                        .map(|_| ())
                })
            })
            .await;
    }

    async fn stage_active_update(&self, active: E::ActiveModel) {
        self.context
            .stage(move |txn| {
                Box::pin(async move { E::update(active).exec(txn).await.map(|_| ()) })
            })
            .await;
    }
}

impl<E> GenericRepository<E>
where
    E: Navigation + SoftDelete,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelBehavior + Send + 'static,
{
    /// Flag the record deleted and stage the update. The row stays.
    pub async fn soft_remove(&self, model: E::Model) {
        let mut active = model.into_active_model();
        active.set(E::deleted_flag(), Value::Bool(Some(true)));
        self.stage_active_update(active).await;
    }

    pub async fn soft_remove_range(&self, models: Vec<E::Model>) {
        for model in models {
            self.soft_remove(model).await;
        }
    }
}
