use crate::domain::NewToast;
use crate::port::ToastRepository;
use cheers_errors::AppError;

const SAMPLE_CREATOR: &str = "system";

pub const SAMPLE_TOASTS: &[&str] = &[
    "To friends old and new: may our glasses stay full and our stories get better every year.",
    "Here's to the nights we won't remember with the friends we'll never forget.",
    "May you always have a clean shirt, a clear conscience, and enough coins to buy a round.",
    "To the cook, the host, and whoever is doing the dishes later.",
    "May the road rise up to meet you, and may it not be too steep on the way home.",
    "To health, love, and the time to enjoy both.",
    "Here's to us. Who's like us? Hardly anyone, and they're all out of town.",
    "May your troubles be as few and as far apart as my grandmother's teeth.",
];

/// Fills an empty repository with the sample toasts. Returns how many were
/// created; a repository that already holds toasts is left alone.
pub async fn seed_sample_toasts(repository: &dyn ToastRepository) -> Result<usize, AppError> {
    if !repository.list_toasts().await?.is_empty() {
        tracing::info!("Toast collection not empty, skipping sample data");
        return Ok(0);
    }

    for text in SAMPLE_TOASTS {
        let new_toast = NewToast::parse(text, Some(SAMPLE_CREATOR))?;
        repository.create_toast(new_toast).await?;
    }
    tracing::info!("Seeded {} sample toasts", SAMPLE_TOASTS.len());
    Ok(SAMPLE_TOASTS.len())
}
