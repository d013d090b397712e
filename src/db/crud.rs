use sqlx::{Executor, Result, Sqlite, SqlitePool};

use super::{CountRow, FrameRow};

/// 添加帧记录
pub async fn add_frame<'c, E>(executor: E, row: &FrameRow) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO frame (id, video, sample_index, descriptor, image_path)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&row.id)
    .bind(&row.video)
    .bind(row.sample_index)
    .bind(&row.descriptor)
    .bind(&row.image_path)
    .execute(executor)
    .await?;

    Ok(())
}

/// 按插入顺序获取所有帧记录
pub async fn get_frames(executor: &SqlitePool) -> Result<Vec<FrameRow>> {
    sqlx::query_as::<_, FrameRow>(
        r#"
        SELECT id, video, sample_index, descriptor, image_path
        FROM frame ORDER BY seq ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

/// 删除一个视频的所有帧记录，返回删除数量
pub async fn delete_video(executor: &SqlitePool, video: &str) -> Result<u64> {
    let result = sqlx::query(r#"DELETE FROM frame WHERE video = ?"#)
        .bind(video)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// 查询数据库中的帧和视频数量
pub async fn get_count(executor: &SqlitePool) -> Result<CountRow> {
    sqlx::query_as::<_, CountRow>(
        r#"
        SELECT COUNT(*) AS frames, COUNT(DISTINCT video) AS videos FROM frame
        "#,
    )
    .fetch_one(executor)
    .await
}
