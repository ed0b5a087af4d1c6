// 認証モジュール

/// パスワードハッシュ化・検証（bcrypt）
pub mod password;

/// JWT生成・検証（jsonwebtoken）
pub mod jwt;

/// ハンドルからのアイデンティティ解決
pub mod credentials;

/// ログインフロー
pub mod login;

/// ロールベースのアクセス制御
pub mod access;

/// 認可ミドルウェア（Bearerトークン）
pub mod middleware;

/// ランダムトークン生成（英数字）
pub fn generate_random_token(length: usize) -> String {
    use rand::RngExt;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
