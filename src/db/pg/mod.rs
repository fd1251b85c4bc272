use std::{collections::HashSet, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    PgPool, Postgres, QueryBuilder, Row, migrate, postgres::PgRow, query, query_as, query_scalar,
};
use tracing::info;

use super::{
    Data, DataI, Entry, EntryFeed, EntryNeighbor, EntryNeighbors, EntryPagination, EntryQuery,
    EntryStatus, FlashKind, FlashMessages, Integrations, MAX_PARSING_ERRORS, NewEntry, NewFeed,
    NewUser, Session, User, create_id, create_token,
};

#[cfg(test)]
pub(super) mod test_utils;

#[derive(Clone)]
pub(super) struct PgData {
    pg_pool: PgPool,
}

impl PgData {
    #[cfg(test)]
    pub(super) fn from_pool(pg_pool: PgPool) -> Self {
        Self { pg_pool }
    }
}

pub(super) async fn new_pg_data(database_url: &str) -> Result<Data> {
    info!("connecting to pg...");

    let pg = PgPool::connect(database_url)
        .await
        .context("error connecting to postgres")?;

    info!("connected to pg, running migrations...");

    migrate!("./src/db/pg/migrations")
        .run(&pg)
        .await
        .context("error running migrations")?;

    info!("migrations completed");

    Ok(Arc::new(PgData { pg_pool: pg }))
}

const ENTRY_SELECT: &str = r#"
    select
        e.id,
        e.user_id,
        e.feed_id,
        e.title,
        e.url,
        e.comments_url,
        e.author,
        e.content,
        e.status,
        e.starred,
        e.published_at,
        e.created_at,
        e.changed_at,
        f.title as feed_title,
        f.site_url as feed_site_url
    from entries e
    inner join feeds f on f.id = e.feed_id
"#;

/// Escapes LIKE metacharacters so the query matches as a literal substring.
fn escape_like(search_query: &str) -> String {
    let mut escaped = String::with_capacity(search_query.len());
    for c in search_query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_search_condition<'a>(builder: &mut QueryBuilder<'a, Postgres>, search_query: &str) {
    let pattern = format!("%{}%", escape_like(search_query));

    builder
        .push(" and (e.title ilike ")
        .push_bind(pattern.clone())
        .push(r" escape '\' or e.content ilike ")
        .push_bind(pattern)
        .push(r" escape '\')");
}

fn push_entry_conditions<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a EntryQuery) {
    builder.push(" where e.user_id = ").push_bind(&query.user_id);

    if let Some(ref entry_id) = query.entry_id {
        builder.push(" and e.id = ").push_bind(entry_id);
    }

    if let Some(status) = query.status {
        builder.push(" and e.status = ").push_bind(status);
    }

    if let Some(status) = query.without_status {
        builder.push(" and e.status <> ").push_bind(status);
    }

    if let Some(ref search_query) = query.search_query {
        push_search_condition(builder, search_query);
    }
}

fn entry_from_row(row: &PgRow) -> Result<Entry, sqlx::Error> {
    Ok(Entry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        feed_id: row.try_get("feed_id")?,
        title: row.try_get("title")?,
        url: row.try_get("url")?,
        comments_url: row.try_get("comments_url")?,
        author: row.try_get("author")?,
        content: row.try_get("content")?,
        status: row.try_get("status")?,
        starred: row.try_get("starred")?,
        published_at: row.try_get("published_at")?,
        created_at: row.try_get("created_at")?,
        changed_at: row.try_get("changed_at")?,
        feed: EntryFeed {
            id: row.try_get("feed_id")?,
            title: row.try_get("feed_title")?,
            site_url: row.try_get("feed_site_url")?,
        },
    })
}

fn session_from_row(row: &PgRow) -> Result<Session, sqlx::Error> {
    Ok(Session {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        csrf_token: row.try_get("csrf_token")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        entry_direction: row.try_get("entry_direction")?,
        theme: row.try_get("theme")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl DataI for PgData {
    async fn create_user(&self, user: &NewUser) -> Result<User, sqlx::Error> {
        let id = create_id();

        let created_at = query_scalar::<_, DateTime<Utc>>(
            r#"
            insert into users (id, username, entry_direction, theme)
            values ($1, $2, $3, $4)
            returning created_at
            "#,
        )
        .bind(&id)
        .bind(&user.username)
        .bind(user.entry_direction)
        .bind(&user.theme)
        .fetch_one(&self.pg_pool)
        .await?;

        Ok(User {
            id,
            username: user.username.clone(),
            entry_direction: user.entry_direction,
            theme: user.theme.clone(),
            created_at,
        })
    }

    async fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, sqlx::Error> {
        let row = query(
            r#"
            select id, username, entry_direction, theme, created_at
            from users
            where id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pg_pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn create_feed(&self, user_id: &str, feed: &NewFeed) -> Result<String, sqlx::Error> {
        let id = query_scalar::<_, String>(
            r#"
            insert into feeds (id, user_id, title, feed_url, site_url)
            values ($1, $2, $3, $4, $5)
            returning id
            "#,
        )
        .bind(create_id())
        .bind(user_id)
        .bind(&feed.title)
        .bind(&feed.feed_url)
        .bind(&feed.site_url)
        .fetch_one(&self.pg_pool)
        .await?;

        Ok(id)
    }

    async fn set_feed_parsing_error(
        &self,
        feed_id: &str,
        error: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let sql = match error {
            Some(_) => {
                r#"
                update feeds
                set parsing_error_count = parsing_error_count + 1,
                    parsing_error_msg = $2,
                    updated_at = now()
                where id = $1
                "#
            }
            None => {
                r#"
                update feeds
                set parsing_error_count = 0,
                    parsing_error_msg = $2,
                    updated_at = now()
                where id = $1
                "#
            }
        };

        query(sql)
            .bind(feed_id)
            .bind(error)
            .execute(&self.pg_pool)
            .await?;

        Ok(())
    }

    async fn insert_entries(
        &self,
        user_id: &str,
        feed_id: &str,
        entries: Vec<NewEntry>,
    ) -> Result<Vec<String>, anyhow::Error> {
        let mut seen = HashSet::new();
        let unique_entries: Vec<_> = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.url.clone()))
            .collect();

        if unique_entries.is_empty() {
            return Ok(vec![]);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "insert into entries (id, user_id, feed_id, title, url, comments_url, author, content, published_at)",
        );

        builder.push_values(unique_entries, |mut b, entry| {
            b.push_bind(create_id());
            b.push_bind(user_id);
            b.push_bind(feed_id);
            b.push_bind(entry.title);
            b.push_bind(entry.url);
            b.push_bind(entry.comments_url);
            b.push_bind(entry.author);
            b.push_bind(entry.content);
            b.push_bind(entry.published_at);
        });

        builder.push(" on conflict (feed_id, url) do nothing returning id");

        let ids = builder
            .build_query_scalar::<String>()
            .fetch_all(&self.pg_pool)
            .await
            .context("error inserting entries")?;

        Ok(ids)
    }

    async fn get_entry(&self, query: &EntryQuery) -> Result<Option<Entry>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(ENTRY_SELECT);
        push_entry_conditions(&mut builder, query);
        builder.push(" limit 1");

        let row = builder.build().fetch_optional(&self.pg_pool).await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn get_entries(&self, query: &EntryQuery) -> Result<Vec<Entry>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(ENTRY_SELECT);
        push_entry_conditions(&mut builder, query);

        let order = query.direction.as_sql();
        builder
            .push(" order by e.published_at ")
            .push(order)
            .push(", e.id ")
            .push(order);

        if let Some(limit) = query.limit {
            builder.push(" limit ").push_bind(limit);
        }

        if let Some(offset) = query.offset {
            builder.push(" offset ").push_bind(offset);
        }

        let rows = builder.build().fetch_all(&self.pg_pool).await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn count_entries(&self, query: &EntryQuery) -> Result<i64, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("select count(*) from entries e");
        push_entry_conditions(&mut builder, query);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pg_pool)
            .await
    }

    async fn set_entries_status(
        &self,
        user_id: &str,
        entry_ids: &[String],
        status: EntryStatus,
    ) -> Result<(), sqlx::Error> {
        if entry_ids.is_empty() {
            return Ok(());
        }

        query(
            r#"
            update entries
            set status = $1,
                changed_at = now()
            where user_id = $2 and id = any($3)
            "#,
        )
        .bind(status)
        .bind(user_id)
        .bind(entry_ids)
        .execute(&self.pg_pool)
        .await?;

        Ok(())
    }

    async fn toggle_bookmark(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<Option<bool>, sqlx::Error> {
        query_scalar::<_, bool>(
            r#"
            update entries
            set starred = not starred,
                changed_at = now()
            where user_id = $1 and id = $2 and status <> $3
            returning starred
            "#,
        )
        .bind(user_id)
        .bind(entry_id)
        .bind(EntryStatus::Removed)
        .fetch_optional(&self.pg_pool)
        .await
    }

    async fn get_entry_neighbors(
        &self,
        pagination: &EntryPagination,
    ) -> Result<EntryNeighbors, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            with entry_pagination as (
                select
                    e.id,
                    lag(e.id) over w as prev_id,
                    lag(e.title) over w as prev_title,
                    lead(e.id) over w as next_id,
                    lead(e.title) over w as next_title
                from entries e
            "#,
        );

        builder
            .push(" where e.user_id = ")
            .push_bind(&pagination.user_id)
            .push(" and e.status <> ")
            .push_bind(EntryStatus::Removed);

        if let Some(ref search_query) = pagination.search_query {
            push_search_condition(&mut builder, search_query);
        }

        let order = pagination.direction.as_sql();
        builder
            .push(" window w as (order by e.published_at ")
            .push(order)
            .push(", e.id ")
            .push(order)
            .push(")")
            .push(" ) select prev_id, prev_title, next_id, next_title")
            .push(" from entry_pagination where id = ")
            .push_bind(&pagination.entry_id);

        let row = builder
            .build_query_as::<(Option<String>, Option<String>, Option<String>, Option<String>)>()
            .fetch_optional(&self.pg_pool)
            .await?;

        let Some((prev_id, prev_title, next_id, next_title)) = row else {
            return Ok(EntryNeighbors::default());
        };

        let neighbor = |id: Option<String>, title: Option<String>| {
            id.map(|id| EntryNeighbor {
                id,
                title: title.unwrap_or_default(),
            })
        };

        Ok(EntryNeighbors {
            prev: neighbor(prev_id, prev_title),
            next: neighbor(next_id, next_title),
        })
    }

    async fn count_unread_entries(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        query_scalar::<_, i64>(
            r#"
            select count(*)
            from entries e
            where e.user_id = $1 and e.status = $2
            "#,
        )
        .bind(user_id)
        .bind(EntryStatus::Unread)
        .fetch_one(&self.pg_pool)
        .await
    }

    async fn count_error_feeds(&self, user_id: &str) -> Result<i64, sqlx::Error> {
        query_scalar::<_, i64>(
            r#"
            select count(*)
            from feeds f
            where f.user_id = $1 and f.parsing_error_count >= $2
            "#,
        )
        .bind(user_id)
        .bind(MAX_PARSING_ERRORS)
        .fetch_one(&self.pg_pool)
        .await
    }

    async fn has_save_entry(&self, user_id: &str) -> Result<bool, sqlx::Error> {
        query_scalar::<_, bool>(
            r#"
            select exists (
                select 1
                from integrations i
                where i.user_id = $1
                and (
                    i.pinboard_enabled
                    or i.instapaper_enabled
                    or i.wallabag_enabled
                    or i.pocket_enabled
                )
            )
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pg_pool)
        .await
    }

    async fn set_integrations(
        &self,
        user_id: &str,
        integrations: &Integrations,
    ) -> Result<(), sqlx::Error> {
        query(
            r#"
            insert into integrations (user_id, pinboard_enabled, instapaper_enabled, wallabag_enabled, pocket_enabled)
            values ($1, $2, $3, $4, $5)
            on conflict (user_id) do update set
                pinboard_enabled = excluded.pinboard_enabled,
                instapaper_enabled = excluded.instapaper_enabled,
                wallabag_enabled = excluded.wallabag_enabled,
                pocket_enabled = excluded.pocket_enabled
            "#,
        )
        .bind(user_id)
        .bind(integrations.pinboard_enabled)
        .bind(integrations.instapaper_enabled)
        .bind(integrations.wallabag_enabled)
        .bind(integrations.pocket_enabled)
        .execute(&self.pg_pool)
        .await?;

        Ok(())
    }

    async fn create_session(&self, user_id: Option<&str>) -> Result<Session, sqlx::Error> {
        let session = Session {
            id: create_token(),
            user_id: user_id.map(str::to_owned),
            csrf_token: create_token(),
        };

        query(
            r#"
            insert into sessions (id, user_id, csrf_token)
            values ($1, $2, $3)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.csrf_token)
        .execute(&self.pg_pool)
        .await?;

        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, sqlx::Error> {
        let row = query(
            r#"
            select id, user_id, csrf_token
            from sessions
            where id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pg_pool)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn set_flash_message(
        &self,
        session_id: &str,
        kind: FlashKind,
        message: &str,
    ) -> Result<(), sqlx::Error> {
        let sql = match kind {
            FlashKind::Info => "update sessions set flash_message = $2 where id = $1",
            FlashKind::Error => "update sessions set flash_error_message = $2 where id = $1",
        };

        query(sql)
            .bind(session_id)
            .bind(message)
            .execute(&self.pg_pool)
            .await?;

        Ok(())
    }

    async fn take_flash_messages(&self, session_id: &str) -> Result<FlashMessages, sqlx::Error> {
        let row = query_as::<_, (Option<String>, Option<String>)>(
            r#"
            update sessions s
            set flash_message = null,
                flash_error_message = null
            from (
                select id, flash_message, flash_error_message
                from sessions
                where id = $1
                for update
            ) old
            where s.id = old.id
            returning old.flash_message, old.flash_error_message
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pg_pool)
        .await?;

        Ok(row
            .map(|(message, error_message)| FlashMessages {
                message,
                error_message,
            })
            .unwrap_or_default())
    }
}
