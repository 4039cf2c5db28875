use super::filters::{ListingQuery, SortField, SortOrder};

/// 매물 컬럼 목록
pub const LISTING_COLUMNS: &str = "l.id, l.user_id, l.title, l.description, l.price, l.category, l.status, l.expires_at, l.last_bumped_at, l.bump_count, l.payment_id, l.pending_payment, l.created_at, l.updated_at";

/// 매물 등록
pub const INSERT_LISTING: &str = r#"
    INSERT INTO listings AS l (user_id, title, description, price, category, status, expires_at, bump_count, pending_payment, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, 'active', $6, 0, FALSE, $7, $7)
    RETURNING l.id, l.user_id, l.title, l.description, l.price, l.category, l.status, l.expires_at, l.last_bumped_at, l.bump_count, l.payment_id, l.pending_payment, l.created_at, l.updated_at
"#;

/// 매물 조회
pub const GET_LISTING: &str = r#"
    SELECT l.id, l.user_id, l.title, l.description, l.price, l.category, l.status, l.expires_at, l.last_bumped_at, l.bump_count, l.payment_id, l.pending_payment, l.created_at, l.updated_at
    FROM listings l
    WHERE l.id = $1
"#;

/// 매물 조회 (행 잠금)
pub const GET_LISTING_FOR_UPDATE: &str = r#"
    SELECT l.id, l.user_id, l.title, l.description, l.price, l.category, l.status, l.expires_at, l.last_bumped_at, l.bump_count, l.payment_id, l.pending_payment, l.created_at, l.updated_at
    FROM listings l
    WHERE l.id = $1
    FOR UPDATE
"#;

/// 만료 처리 (active -> expired)
pub const EXPIRE_DUE_LISTINGS: &str = r#"
    UPDATE listings SET status = 'expired', updated_at = $1
    WHERE status = 'active' AND expires_at <= $1
"#;

/// 끌어올리기 결과 기록
pub const APPLY_BUMP: &str = r#"
    UPDATE listings AS l SET
        status = $2,
        expires_at = $3,
        last_bumped_at = $4,
        bump_count = $5,
        payment_id = $6,
        pending_payment = CASE WHEN $7 THEN FALSE ELSE l.pending_payment END,
        updated_at = $4
    WHERE l.id = $1
    RETURNING l.id, l.user_id, l.title, l.description, l.price, l.category, l.status, l.expires_at, l.last_bumped_at, l.bump_count, l.payment_id, l.pending_payment, l.created_at, l.updated_at
"#;

/// 보관 처리
pub const ARCHIVE_LISTING: &str = r#"
    UPDATE listings AS l SET status = 'archived', updated_at = $2
    WHERE l.id = $1
    RETURNING l.id, l.user_id, l.title, l.description, l.price, l.category, l.status, l.expires_at, l.last_bumped_at, l.bump_count, l.payment_id, l.pending_payment, l.created_at, l.updated_at
"#;

/// 결제 대기 표시
pub const MARK_PAYMENT_PENDING: &str = r#"
    UPDATE listings AS l SET payment_id = $2, pending_payment = TRUE, updated_at = $3
    WHERE l.id = $1
    RETURNING l.id, l.user_id, l.title, l.description, l.price, l.category, l.status, l.expires_at, l.last_bumped_at, l.bump_count, l.payment_id, l.pending_payment, l.created_at, l.updated_at
"#;

/// 매물 이미지 개수
pub const COUNT_LISTING_IMAGES: &str =
    "SELECT COUNT(*) FROM listing_images WHERE listing_id = $1";

/// 매물 이미지 추가
pub const INSERT_LISTING_IMAGE: &str = r#"
    INSERT INTO listing_images (listing_id, storage_key, position, created_at)
    VALUES ($1, $2, $3, $4)
    RETURNING id, listing_id, storage_key, position, created_at
"#;

/// 프로필 조회
pub const GET_PROFILE: &str =
    "SELECT user_id, display_name, is_banned, is_admin FROM profiles WHERE user_id = $1";

/// 바인딩 값
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i64),
    Text(String),
    TextArray(Vec<String>),
}

/// 조합된 목록 조회 쿼리
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

/// 목록 조회 SQL 조합
pub fn compose_list_query(query: &ListingQuery) -> ComposedQuery {
    let mut sql = format!("SELECT {LISTING_COLUMNS} FROM listings l");
    let mut binds: Vec<BindValue> = Vec::new();
    let mut conditions: Vec<String> = Vec::new();

    if query.exclude_banned {
        sql.push_str(" LEFT JOIN profiles p ON p.user_id = l.user_id");
        conditions.push("COALESCE(p.is_banned, FALSE) = FALSE".to_string());
    }

    binds.push(BindValue::TextArray(
        query
            .statuses
            .iter()
            .map(|status| status.as_str().to_string())
            .collect(),
    ));
    conditions.push(format!("l.status = ANY(${})", binds.len()));

    if let Some(category) = query.category {
        binds.push(BindValue::Text(category.as_str().to_string()));
        conditions.push(format!("l.category = ${}", binds.len()));
    }
    if let Some(min) = query.price_min {
        binds.push(BindValue::Int(min));
        conditions.push(format!("l.price >= ${}", binds.len()));
    }
    if let Some(max) = query.price_max {
        binds.push(BindValue::Int(max));
        conditions.push(format!("l.price <= ${}", binds.len()));
    }
    if let Some(term) = &query.search {
        binds.push(BindValue::Text(format!("%{}%", escape_like(term))));
        let n = binds.len();
        conditions.push(format!(
            "(l.title ILIKE ${n} OR l.description ILIKE ${n} OR l.category ILIKE ${n})"
        ));
    }
    if let Some(user_id) = query.user_id {
        binds.push(BindValue::Int(user_id));
        conditions.push(format!("l.user_id = ${}", binds.len()));
    }

    sql.push_str(" WHERE ");
    sql.push_str(&conditions.join(" AND "));

    let column = match query.sort_by {
        SortField::CreatedAt => "l.created_at",
        SortField::Price => "l.price",
    };
    let direction = match query.sort_order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    sql.push_str(&format!(
        " ORDER BY {column} {direction}, l.id {direction}"
    ));

    binds.push(BindValue::Int(query.limit));
    sql.push_str(&format!(" LIMIT ${}", binds.len()));
    binds.push(BindValue::Int(query.offset));
    sql.push_str(&format!(" OFFSET ${}", binds.len()));

    ComposedQuery { sql, binds }
}

/// LIKE 패턴 특수문자 이스케이프
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
