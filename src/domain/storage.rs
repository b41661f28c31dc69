/// キーバリュー型の永続化先。Infra層が実装する。
///
/// 何をどのキーに保存するかは application 層が決める。
pub trait KeyValueStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// 保存先が使用可能か。false のとき読み書きは行わない。
    fn is_available(&self) -> bool;

    /// キーの値を返す。キーが無ければ `Ok(None)`。
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// 値を挿入または上書きする。
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;
}
