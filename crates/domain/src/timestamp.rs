use chrono::Utc;

/// エポックミリ秒のタイムスタンプ
///
/// 更新時刻はストレージではなくハンドラー側で付与する
pub type Timestamp = i64;

/// 現在時刻をエポックミリ秒で取得
pub fn current_timestamp() -> Timestamp {
    Utc::now().timestamp_millis()
}
