pub mod toast;

pub use toast::Entity as ToastEntity;
