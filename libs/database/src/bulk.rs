use akashi_models::alternative::Alternative;
use akashi_models::evidence::Evidence;
use akashi_models::event::AgentEvent;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Bulk-appends events to the partitioned event table via `COPY ... FROM
/// STDIN`, the fast path the event buffer's flush loop relies on (§4.5).
/// Driven by CSV framing rather than the binary COPY format: the row count
/// here is large but the per-row payload is small JSON, and CSV keeps the
/// encoding straightforward to get byte-exact.
pub async fn bulk_insert_events(pool: &PgPool, events: &[AgentEvent]) -> Result<u64, sqlx::Error> {
    if events.is_empty() {
        return Ok(0);
    }

    let mut conn = pool.acquire().await?;
    let mut copy = conn
        .copy_in_raw(
            "COPY agent_events (id, org_id, run_id, agent_id, event_type, sequence_num, occurred_at, payload, created_at) \
             FROM STDIN WITH (FORMAT csv)",
        )
        .await?;

    let mut buf = Vec::new();
    for event in events {
        buf.extend_from_slice(csv_field(&event.id.to_string()).as_bytes());
        buf.push(b',');
        buf.extend_from_slice(csv_field(&event.org_id.to_string()).as_bytes());
        buf.push(b',');
        buf.extend_from_slice(csv_field(&event.run_id.to_string()).as_bytes());
        buf.push(b',');
        buf.extend_from_slice(csv_field(&event.agent_id.to_string()).as_bytes());
        buf.push(b',');
        buf.extend_from_slice(csv_field(&event.event_type).as_bytes());
        buf.push(b',');
        buf.extend_from_slice(event.sequence_num.to_string().as_bytes());
        buf.push(b',');
        buf.extend_from_slice(csv_field(&event.occurred_at.to_rfc3339()).as_bytes());
        buf.push(b',');
        buf.extend_from_slice(csv_field(&event.payload.to_string()).as_bytes());
        buf.push(b',');
        buf.extend_from_slice(csv_field(&event.created_at.to_rfc3339()).as_bytes());
        buf.push(b'\n');
    }

    copy.send(buf).await?;
    let rows = copy.finish().await?;
    Ok(rows)
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Bulk-inserts a decision's alternatives inside the caller's transaction
/// using `UNNEST`-bound arrays — a single round trip regardless of count,
/// the "bulk copy" the ingestion transaction needs for its lower-volume
/// child rows (§4.4 step 3).
pub async fn bulk_insert_alternatives(
    tx: &mut Transaction<'_, Postgres>,
    decision_id: Uuid,
    rows: &[(String, Option<f64>, bool, Option<String>)],
) -> Result<Vec<Alternative>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = (0..rows.len()).map(|_| Uuid::new_v4()).collect();
    let decision_ids: Vec<Uuid> = std::iter::repeat(decision_id).take(rows.len()).collect();
    let labels: Vec<String> = rows.iter().map(|r| r.0.clone()).collect();
    let scores: Vec<Option<f64>> = rows.iter().map(|r| r.1).collect();
    let selected: Vec<bool> = rows.iter().map(|r| r.2).collect();
    let reasons: Vec<Option<String>> = rows.iter().map(|r| r.3.clone()).collect();

    sqlx::query_as::<_, Alternative>(
        r#"
        INSERT INTO alternatives (id, decision_id, label, score, selected, rejection_reason)
        SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::text[], $4::float8[], $5::bool[], $6::text[])
        RETURNING id, decision_id, label, score, selected, rejection_reason
        "#,
    )
    .bind(&ids)
    .bind(&decision_ids)
    .bind(&labels)
    .bind(&scores)
    .bind(&selected)
    .bind(&reasons)
    .fetch_all(&mut **tx)
    .await
}

/// Bulk-inserts a decision's evidence inside the caller's transaction,
/// mirroring `bulk_insert_alternatives`.
pub async fn bulk_insert_evidence(
    tx: &mut Transaction<'_, Postgres>,
    decision_id: Uuid,
    org_id: Uuid,
    rows: &[(String, Option<String>, String, Option<f64>, Option<pgvector::Vector>)],
) -> Result<Vec<Evidence>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = (0..rows.len()).map(|_| Uuid::new_v4()).collect();
    let decision_ids: Vec<Uuid> = std::iter::repeat(decision_id).take(rows.len()).collect();
    let org_ids: Vec<Uuid> = std::iter::repeat(org_id).take(rows.len()).collect();
    let source_types: Vec<String> = rows.iter().map(|r| r.0.clone()).collect();
    let source_uris: Vec<Option<String>> = rows.iter().map(|r| r.1.clone()).collect();
    let contents: Vec<String> = rows.iter().map(|r| r.2.clone()).collect();
    let relevance_scores: Vec<Option<f64>> = rows.iter().map(|r| r.3).collect();

    let mut evidence = sqlx::query_as::<_, Evidence>(
        r#"
        INSERT INTO evidence (id, decision_id, org_id, source_type, source_uri, content, relevance_score)
        SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::text[], $5::text[], $6::text[], $7::float8[])
        RETURNING id, decision_id, org_id, source_type, source_uri, content, relevance_score, NULL::vector AS embedding
        "#,
    )
    .bind(&ids)
    .bind(&decision_ids)
    .bind(&org_ids)
    .bind(&source_types)
    .bind(&source_uris)
    .bind(&contents)
    .bind(&relevance_scores)
    .fetch_all(&mut **tx)
    .await?;

    // Embeddings, when present, are set per-row after the bulk insert: they
    // are computed per evidence item and arrive as a parallel optional list
    // rather than a bindable array column shared across all rows.
    for (row, (_, _, _, _, embedding)) in evidence.iter_mut().zip(rows.iter()) {
        if let Some(vector) = embedding {
            sqlx::query("UPDATE evidence SET embedding = $1 WHERE id = $2")
                .bind(vector)
                .bind(row.id)
                .execute(&mut **tx)
                .await?;
            row.embedding = Some(vector.clone());
        }
    }

    Ok(evidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_field_quotes_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("a\"b"), "\"a\"\"b\"");
    }
}
