use elusiv_demo_config::{LAMPORTS_PER_SOL, Settings};
use elusiv_demo_privacy::{SdkError, TokenType};
use solana_sdk::pubkey::Pubkey;

/// Workflow parameters taken from validated configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSettings {
    pub token: TokenType,
    pub top_up_amount: u64,
    pub send_amount: u64,
    pub recipient: Option<Pubkey>,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            token: TokenType::Lamports,
            top_up_amount: LAMPORTS_PER_SOL,
            send_amount: LAMPORTS_PER_SOL / 2,
            recipient: None,
        }
    }
}

impl WalletSettings {
    pub fn from_settings(settings: &Settings) -> Result<Self, SdkError> {
        Ok(Self {
            token: settings.token.parse()?,
            top_up_amount: settings.top_up_amount,
            send_amount: settings.send_amount,
            recipient: settings.recipient,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elusiv_demo_config::DemoConfig;

    #[test]
    fn test_from_settings_parses_token() {
        let mut settings = DemoConfig::default().validate().unwrap();
        settings.token = "usdc".into();
        settings.send_amount = 42;

        let wallet = WalletSettings::from_settings(&settings).unwrap();
        assert_eq!(wallet.token, TokenType::Usdc);
        assert_eq!(wallet.send_amount, 42);
        assert_eq!(wallet.top_up_amount, settings.top_up_amount);
    }

    #[test]
    fn test_from_settings_rejects_unknown_token() {
        let mut settings = DemoConfig::default().validate().unwrap();
        settings.token = "DOGE".into();
        assert!(WalletSettings::from_settings(&settings).is_err());
    }
}
