use alloy::dyn_abi::TypedData;
use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use error_stack::{ResultExt as _, report};
use gasless_models::models::signature::Signature65;
use gasless_models::models::typed_data::Eip712TypedData;

use crate::error::{Error, TraderResult};

/// Capability boundary around whatever holds the taker's key.
///
/// Implementations must not mutate the passed-in object and must resolve
/// exactly once per call. Failures are surfaced as [`Error::UserRejected`]
/// or [`Error::SignerUnavailable`]; neither is retried automatically.
#[async_trait]
pub trait TradeSigner: Send + Sync {
    /// Address signatures recover to, as a 0x-prefixed checksummed string.
    fn address(&self) -> String;

    async fn sign_typed_data(&self, typed_data: &Eip712TypedData) -> TraderResult<Signature65>;
}

#[async_trait]
impl<T: TradeSigner + ?Sized> TradeSigner for &T {
    fn address(&self) -> String {
        (**self).address()
    }

    async fn sign_typed_data(&self, typed_data: &Eip712TypedData) -> TraderResult<Signature65> {
        (**self).sign_typed_data(typed_data).await
    }
}

/// In-process signer over a raw secp256k1 key. Suitable for bots and tests;
/// interactive wallets plug in through their own [`TradeSigner`] instead.
#[derive(Debug, Clone)]
pub struct LocalKeySigner {
    inner: PrivateKeySigner,
}

impl LocalKeySigner {
    pub fn new(private_key_hex: &str) -> TraderResult<Self> {
        let inner = private_key_hex
            .parse::<PrivateKeySigner>()
            .map_err(|e| report!(Error::SignerUnavailable(format!("invalid private key: {e}"))))?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl TradeSigner for LocalKeySigner {
    fn address(&self) -> String {
        self.inner.address().to_string()
    }

    async fn sign_typed_data(&self, typed_data: &Eip712TypedData) -> TraderResult<Signature65> {
        let raw = serde_json::to_value(typed_data).change_context(Error::ParseError)?;
        let typed: TypedData = serde_json::from_value(raw)
            .change_context(Error::ModelsError)
            .attach_printable("quote typed data is not a resolvable EIP-712 object")?;

        let digest = typed.eip712_signing_hash().map_err(|e| {
            report!(Error::ModelsError)
                .attach_printable(format!("EIP-712 digest computation failed: {e}"))
        })?;

        let signature = self
            .inner
            .sign_hash(&digest)
            .await
            .map_err(|e| report!(Error::SignerUnavailable(e.to_string())))?;

        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
        bytes[32..64].copy_from_slice(&signature.s().to_be_bytes::<32>());
        // Raw parity bit; the splitter normalizes it to the EVM 27/28 form.
        bytes[64] = signature.v() as u8;

        Ok(Signature65(bytes))
    }
}
