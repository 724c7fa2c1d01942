//! Command dispatch. Results are printed to stdout as pretty JSON.

use serde::Serialize;
use serde_json::json;
use tracing::info;
use url::Url;

use crate::api::{AdminApi, Announcement, ApiError, EmoticonUpload, LoginCallback, ProductForm, ReviewFilter};
use crate::auth::{ACCESS_COOKIE_NAME, TokenStore};
use crate::cli::{
    Command, EmoticonCommand, MagazineCommand, MatchingCommand, ProductCommand, ReviewCommand, WordCommand,
};
use crate::jwt::decode_payload;

fn print_json<T: Serialize>(value: &T) -> Result<(), ApiError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| ApiError::invalid_input(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn done(action: &str) -> Result<(), ApiError> {
    print_json(&json!({ "ok": true, "action": action }))
}

pub async fn run(api: &AdminApi, command: Command) -> Result<(), ApiError> {
    match command {
        Command::LoginUrl => {
            println!("{}", api.login_url()?);
            Ok(())
        }
        Command::Login { callback_url } => {
            let url = Url::parse(&callback_url)?;
            let callback = LoginCallback::parse(&url)?;
            let outcome = api.complete_login(&callback).await?;
            print_json(&json!({ "profile": outcome.profile, "email": outcome.email }))
        }
        Command::Logout => {
            api.logout().await?;
            done("logout")
        }
        Command::Whoami => whoami(api),
        Command::Profile => print_json(&api.profile().await?),
        Command::SuspendedUsers => print_json(&api.suspended_users().await?),
        Command::Reports => print_json(&api.reported_users().await?),
        Command::Emoticons(cmd) => emoticons(api, cmd).await,
        Command::Magazines(cmd) => magazines(api, cmd).await,
        Command::Matchings(cmd) => matchings(api, cmd).await,
        Command::Reviews(cmd) => reviews(api, cmd).await,
        Command::Products(cmd) => products(api, cmd).await,
        Command::Words(cmd) => words(api, cmd).await,
        Command::Announce { title, announcement_id } => {
            api.send_announcement(&Announcement { title, announcement_id }).await?;
            done("announce")
        }
    }
}

/// Local view of the session; makes no request.
fn whoami(api: &AdminApi) -> Result<(), ApiError> {
    let store = api.auth_store();
    let expires_at = api
        .client()
        .tokens()
        .get(ACCESS_COOKIE_NAME)
        .and_then(|token| decode_payload(&token))
        .and_then(|payload| payload.expires_at())
        .map(|at| at.to_rfc3339());

    print_json(&json!({
        "authenticated": store.is_authenticated(),
        "email": store.user_email(),
        "profile": store.user(),
        "accessTokenExpiresAt": expires_at,
    }))
}

async fn emoticons(api: &AdminApi, cmd: EmoticonCommand) -> Result<(), ApiError> {
    match cmd {
        EmoticonCommand::Pending => print_json(&api.pending_emoticons().await?),
        EmoticonCommand::Popular { limit } => print_json(&api.popular_emoticons(limit).await?),
        EmoticonCommand::Upload { file, name, price } => {
            let image = std::fs::read(&file)
                .map_err(|e| ApiError::invalid_input(format!("cannot read {}: {}", file.display(), e)))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| ApiError::invalid_input("image path has no file name"))?;
            info!(file = %file.display(), bytes = image.len(), "Uploading emoticon");
            api.upload_emoticon(file_name, image, &EmoticonUpload { name, price })
                .await?;
            done("emoticon-upload")
        }
        EmoticonCommand::Accept { id } => {
            api.accept_emoticon(id).await?;
            done("emoticon-accept")
        }
        EmoticonCommand::Reject { id } => {
            api.reject_emoticon(id).await?;
            done("emoticon-reject")
        }
    }
}

async fn magazines(api: &AdminApi, cmd: MagazineCommand) -> Result<(), ApiError> {
    match cmd {
        MagazineCommand::List => print_json(&api.magazines().await?),
        MagazineCommand::Show { id } => print_json(&api.magazine(id).await?),
        MagazineCommand::Delete { id } => {
            api.delete_magazine(id).await?;
            done("magazine-delete")
        }
        MagazineCommand::Stats => print_json(&api.magazine_category_stats().await?),
        MagazineCommand::Pending { page, size } => print_json(&api.pending_magazines(page, size).await?),
        MagazineCommand::Accept { id } => {
            api.accept_magazine(id).await?;
            done("magazine-accept")
        }
        MagazineCommand::Reject { id } => {
            api.reject_magazine(id).await?;
            done("magazine-reject")
        }
    }
}

async fn matchings(api: &AdminApi, cmd: MatchingCommand) -> Result<(), ApiError> {
    match cmd {
        MatchingCommand::List { category, page, size } => {
            print_json(&api.matchings(category, page, size).await?)
        }
        MatchingCommand::Reject { id } => {
            api.reject_matching(id).await?;
            done("matching-reject")
        }
    }
}

async fn reviews(api: &AdminApi, cmd: ReviewCommand) -> Result<(), ApiError> {
    match cmd {
        ReviewCommand::List {
            min_rating,
            max_rating,
            reported,
            page,
            size,
        } => {
            let filter = ReviewFilter {
                min_rating,
                max_rating,
                reported,
            };
            print_json(&api.reviews(&filter, page, size).await?)
        }
        ReviewCommand::Delete { id } => {
            api.delete_review(id).await?;
            done("review-delete")
        }
    }
}

async fn products(api: &AdminApi, cmd: ProductCommand) -> Result<(), ApiError> {
    match cmd {
        ProductCommand::List => print_json(&api.products().await?),
        ProductCommand::Create {
            points,
            amount,
            promotion,
        } => {
            api.create_product(&ProductForm::new(points, amount, promotion)).await?;
            done("product-create")
        }
        ProductCommand::Update {
            product_id,
            points,
            amount,
            promotion,
        } => {
            api.update_product(product_id, &ProductForm::new(points, amount, promotion))
                .await?;
            done("product-update")
        }
        ProductCommand::Delete { product_id } => {
            api.delete_product(product_id).await?;
            done("product-delete")
        }
    }
}

async fn words(api: &AdminApi, cmd: WordCommand) -> Result<(), ApiError> {
    match cmd {
        WordCommand::List => print_json(&api.filtering_words().await?),
        WordCommand::Add { word } => {
            api.add_filtering_word(&word).await?;
            done("word-add")
        }
        WordCommand::Update { id, word } => {
            api.update_filtering_word(id, &word).await?;
            done("word-update")
        }
        WordCommand::Delete { id } => {
            api.delete_filtering_word(id).await?;
            done("word-delete")
        }
        WordCommand::Activate { id } => {
            api.activate_filtering_word(id).await?;
            done("word-activate")
        }
        WordCommand::Deactivate { id } => {
            api.deactivate_filtering_word(id).await?;
            done("word-deactivate")
        }
        WordCommand::Refresh => {
            api.refresh_filtering_words().await?;
            done("word-refresh")
        }
    }
}
