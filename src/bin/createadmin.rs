use chrono::Utc;
use dotenvy::dotenv;
use std::io::{self, Write};
use uniassist::{db, store::PgStore, store::Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🛡️  UniAssist - Create or Reset Admin");
    println!("==========================================");

    dotenv().ok();

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("❌ DATABASE_URL must be set in the environment or .env file");
            std::process::exit(1);
        }
    };

    let pool = db::create_pool(&database_url, 1).await?;
    let store = PgStore::new(pool.clone());

    print!("Username: ");
    io::stdout().flush()?;
    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    let username = username.trim().to_string();

    if username.is_empty() {
        eprintln!("❌ Username cannot be empty");
        return Ok(());
    }

    let existing = store.find_admin(&username).await?.is_some();
    if existing {
        println!("ℹ️  Admin '{}' exists; the password will be reset and any open session ended.", username);
    }

    print!("Password: ");
    io::stdout().flush()?;
    let password = rpassword::read_password()?;

    if password.len() < 6 {
        eprintln!("❌ Password must be at least 6 characters long");
        return Ok(());
    }

    print!("Password (again): ");
    io::stdout().flush()?;
    let password_confirm = rpassword::read_password()?;

    if password != password_confirm {
        eprintln!("❌ Passwords don't match");
        return Ok(());
    }

    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;
    match store.upsert_admin(&username, &password_hash, Utc::now()).await {
        Ok(()) => {
            println!();
            println!("✅ Admin '{}' {} successfully!", username, if existing { "updated" } else { "created" });
            println!("🌐 Log in at: http://localhost:3000/admin");
        }
        Err(e) => eprintln!("❌ Failed to save admin: {}", e),
    }

    pool.close().await;
    Ok(())
}
