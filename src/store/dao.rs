//! Per-kind DAO implementations for occurrence statistics.
//!
//! The access patterns are a closed, small set (persist, get by identity,
//! all mentions, total mentions, top values), so each one is a fixed
//! parametrized query instead of runtime query construction. The three table
//! impls are identical up to table and value type, and are stamped out by
//! `mentionable_dao!`.

use crate::error::StoreError;
use crate::mention::{
    EmojiMention, EntityMention, MentionRecord, Mentionable, MessageSummary,
};
use crate::model::{Interval, MessageType};
use indexmap::IndexMap;

/// Occurrence-statistics DAO over one mentionable kind.
///
/// All interval queries are half-open: inclusive of `interval.start`,
/// exclusive of `interval.end`. Empty `rooms`/`users` slices mean
/// "no restriction"; non-empty slices are a disjunction within the set and a
/// conjunction across dimensions.
pub trait MentionableDao: Send + Sync {
    type Record: Mentionable;

    /// Persist one record. Fails with [`StoreError::Duplicate`] if the
    /// identity tuple already exists; the existing row is left untouched.
    fn persist(&self, record: &Self::Record) -> Result<(), StoreError>;

    /// Fetch a record by its identity tuple. All identity fields of the
    /// template must be set; non-identity fields are ignored for lookup.
    fn get(&self, template: &Self::Record) -> Result<Self::Record, StoreError>;

    /// All mention occurrences matching the filters.
    fn get_all_mentions(
        &self,
        value_filter: Option<&<Self::Record as Mentionable>::Value>,
        interval: &Interval,
        rooms: &[String],
        users: &[String],
    ) -> Result<Vec<Self::Record>, StoreError>;

    /// Sum of `occurrences` over the matching set; 0 when nothing matches.
    fn get_total_mentions(
        &self,
        value_filter: Option<&<Self::Record as Mentionable>::Value>,
        interval: &Interval,
        rooms: &[String],
        users: &[String],
    ) -> Result<i64, StoreError>;

    /// Top values by summed occurrences, descending, at most `limit` entries.
    /// Insertion order of the returned map is rank order.
    fn get_top_values(
        &self,
        interval: &Interval,
        rooms: &[String],
        users: &[String],
        limit: usize,
    ) -> Result<IndexMap<<Self::Record as Mentionable>::Value, i64>, StoreError>;
}

macro_rules! mentionable_dao {
    ($(#[$doc:meta])* $dao:ident, $record:ty, $value_ty:ty, $table:ident) => {
        $(#[$doc])*
        pub struct $dao {
            pool: crate::store::Pool,
        }

        impl $dao {
            pub fn new(database: &crate::store::Database) -> Self {
                Self {
                    pool: crate::store::Pool::clone(database.pool()),
                }
            }

            fn conn(&self) -> Result<crate::store::PooledConnection, StoreError> {
                self.pool
                    .get()
                    .map_err(|e| StoreError::Unavailable(e.to_string()))
            }
        }

        impl MentionableDao for $dao {
            type Record = $record;

            fn persist(&self, record: &$record) -> Result<(), StoreError> {
                use crate::store::schema::$table;
                use diesel::prelude::*;

                let mut conn = self.conn()?;
                diesel::insert_into($table::table)
                    .values(record)
                    .execute(&mut conn)
                    .map_err(StoreError::from_write)?;
                Ok(())
            }

            fn get(&self, template: &$record) -> Result<$record, StoreError> {
                use crate::store::schema::$table;
                use diesel::prelude::*;

                let mut conn = self.conn()?;
                $table::table
                    .select((
                        $table::username,
                        $table::room_name,
                        $table::mention_time,
                        $table::value,
                        $table::occurrences,
                        $table::bot,
                    ))
                    .filter($table::value.eq(template.value()))
                    .filter($table::username.eq(template.username()))
                    .filter($table::room_name.eq(template.room_name()))
                    .filter($table::mention_time.eq(template.mention_time()))
                    .first::<$record>(&mut conn)
                    .map_err(StoreError::from_read)
            }

            fn get_all_mentions(
                &self,
                value_filter: Option<&$value_ty>,
                interval: &Interval,
                rooms: &[String],
                users: &[String],
            ) -> Result<Vec<$record>, StoreError> {
                use crate::store::schema::$table;
                use diesel::prelude::*;

                let mut conn = self.conn()?;
                let mut query = $table::table
                    .select((
                        $table::username,
                        $table::room_name,
                        $table::mention_time,
                        $table::value,
                        $table::occurrences,
                        $table::bot,
                    ))
                    .filter($table::mention_time.ge(interval.start))
                    .filter($table::mention_time.lt(interval.end))
                    .into_boxed();

                if let Some(wanted) = value_filter {
                    query = query.filter($table::value.eq(wanted));
                }
                if !rooms.is_empty() {
                    query = query.filter($table::room_name.eq_any(rooms));
                }
                if !users.is_empty() {
                    query = query.filter($table::username.eq_any(users));
                }

                query
                    .load::<$record>(&mut conn)
                    .map_err(StoreError::from_read)
            }

            fn get_total_mentions(
                &self,
                value_filter: Option<&$value_ty>,
                interval: &Interval,
                rooms: &[String],
                users: &[String],
            ) -> Result<i64, StoreError> {
                use crate::store::schema::$table;
                use diesel::dsl::sum;
                use diesel::prelude::*;

                let mut conn = self.conn()?;
                let mut query = $table::table
                    .select(sum($table::occurrences))
                    .filter($table::mention_time.ge(interval.start))
                    .filter($table::mention_time.lt(interval.end))
                    .into_boxed();

                if let Some(wanted) = value_filter {
                    query = query.filter($table::value.eq(wanted));
                }
                if !rooms.is_empty() {
                    query = query.filter($table::room_name.eq_any(rooms));
                }
                if !users.is_empty() {
                    query = query.filter($table::username.eq_any(users));
                }

                let total: Option<i64> = query
                    .first(&mut conn)
                    .map_err(StoreError::from_read)?;
                Ok(total.unwrap_or(0))
            }

            fn get_top_values(
                &self,
                interval: &Interval,
                rooms: &[String],
                users: &[String],
                limit: usize,
            ) -> Result<IndexMap<$value_ty, i64>, StoreError> {
                use crate::store::schema::$table;
                use diesel::dsl::sum;
                use diesel::prelude::*;

                let mut conn = self.conn()?;
                let mut query = $table::table
                    .group_by($table::value)
                    .select(($table::value, sum($table::occurrences)))
                    .order_by(sum($table::occurrences).desc())
                    .filter($table::mention_time.ge(interval.start))
                    .filter($table::mention_time.lt(interval.end))
                    .into_boxed();

                if !rooms.is_empty() {
                    query = query.filter($table::room_name.eq_any(rooms));
                }
                if !users.is_empty() {
                    query = query.filter($table::username.eq_any(users));
                }

                let rows: Vec<($value_ty, Option<i64>)> = query
                    .limit(limit as i64)
                    .load(&mut conn)
                    .map_err(StoreError::from_read)?;

                // IndexMap preserves rank order: rank-1 first.
                let mut result = IndexMap::with_capacity(rows.len());
                for (val, total) in rows {
                    result.insert(val, total.unwrap_or(0));
                }
                Ok(result)
            }
        }
    };
}

mentionable_dao!(
    /// Occurrence statistics over extracted entity mentions.
    EntityMentionDao,
    EntityMention,
    String,
    entity_mentions
);

mentionable_dao!(
    /// Occurrence statistics over emoji mentions.
    EmojiMentionDao,
    EmojiMention,
    String,
    emoji_mentions
);

mentionable_dao!(
    /// Occurrence statistics over per-message summary events.
    MessageSummaryDao,
    MessageSummary,
    MessageType,
    message_summaries
);

/// The three per-kind DAOs bundled behind one handle, shared by the pipeline
/// sink and the analytics engine.
pub struct MentionStore {
    pub entities: EntityMentionDao,
    pub emoji: EmojiMentionDao,
    pub summaries: MessageSummaryDao,
}

impl MentionStore {
    pub fn new(database: &crate::store::Database) -> Self {
        Self {
            entities: EntityMentionDao::new(database),
            emoji: EmojiMentionDao::new(database),
            summaries: MessageSummaryDao::new(database),
        }
    }

    /// Persist a tagged record into the table for its kind.
    pub fn persist_record(&self, record: &MentionRecord) -> Result<(), StoreError> {
        match record {
            MentionRecord::Entity(m) => self.entities.persist(m),
            MentionRecord::Emoji(m) => self.emoji.persist(m),
            MentionRecord::Summary(m) => self.summaries.persist(m),
        }
    }
}
