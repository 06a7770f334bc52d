use crate::core::errors::ApiError;
use crate::core::helpers::gravatar_url;
use crate::core::store::AccountStore;
use crate::follow::FollowGraph;
use crate::models::{Account, NewAccount};

const DEMO_USERS: [(&str, &str); 3] = [
    ("test", "Test user bio"),
    ("alice", "Hello, I'm Alice!"),
    ("bob", "Bob's corner of the internet"),
];

/// Creates the `test`, `alice` and `bob` demo accounts (password = username)
/// when missing, and makes `test` follow `bob`. Safe to run repeatedly.
pub async fn init_demo_data(
    store: &dyn AccountStore,
    graph: &FollowGraph,
    avatar_size: u32,
) -> Result<(), ApiError> {
    let existing = store.get_all().await?;
    let mut seeded: Vec<Account> = Vec::new();

    for (username, bio) in DEMO_USERS {
        if let Some(account) = existing.iter().find(|a| a.username == username) {
            seeded.push(account.clone());
            continue;
        }

        let email = format!("{}@example.com", username);
        let account = store
            .create(NewAccount {
                username: username.to_string(),
                avatar: gravatar_url(&email, avatar_size),
                email,
                password: username.to_string(),
                display_name: username.to_string(),
                bio: bio.to_string(),
                birth_date: None,
            })
            .await?;
        tracing::info!(user_id = %account.id, %username, "seeded demo account");
        seeded.push(account);
    }

    let (test, bob) = (&seeded[0], &seeded[2]);
    graph.follow(bob.id, test.id).await
}
