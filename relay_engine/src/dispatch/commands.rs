use log::*;
use serde_json::{json, Map, Value};

use crate::{
    db_types::Principal,
    messages::{CommandEnvelope, CommandTag, Envelope},
    traits::{PaymentProvider, ProviderError},
};

/// Routes client commands to their handlers.
///
/// The handler set is fixed: one per [`CommandTag`]. Each handler takes the session's principal and the command
/// payload, talks to the payment provider, and always produces an envelope. Provider failures are turned into `error`
/// envelopes here and never escape, so a failed payment can't take a session down with it.
///
/// The dispatcher keeps no per-user state. The principal is handed in with every call.
pub struct CommandDispatcher<P> {
    provider: P,
}

type HandlerResult = Result<Envelope, HandlerError>;

/// Why a handler gave up. Both flavours end up as an `error` envelope.
#[derive(Debug)]
enum HandlerError {
    Invalid(&'static str),
    Provider(ProviderError),
}

impl From<ProviderError> for HandlerError {
    fn from(e: ProviderError) -> Self {
        HandlerError::Provider(e)
    }
}

impl<P: PaymentProvider> CommandDispatcher<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Runs the handler for `command` and returns the reply. The command's correlation id, if any, is echoed back.
    pub async fn dispatch(&self, principal: &Principal, command: CommandEnvelope) -> Envelope {
        let tag = command.command();
        trace!("🔌️ Dispatching '{tag}' for user #{}", principal.id);
        let data = command.data;
        let result = match tag {
            CommandTag::Ping => Ok(Self::ping()),
            CommandTag::User => self.user(principal).await,
            CommandTag::CreateInvoice => self.create_invoice(principal, &data).await,
            CommandTag::Pay => self.pay(principal, &data).await,
            CommandTag::Invoice => self.invoice(&data).await,
            CommandTag::PayLnurlp => self.pay_lnurlp(principal, &data).await,
            CommandTag::PayLnurlw => self.pay_lnurlw(principal, &data).await,
            CommandTag::Unhandled => {
                debug!("🔌️ Unhandled command: '{}'", command.tag);
                Ok(Envelope::unhandled())
            },
        };
        let envelope = result.unwrap_or_else(|e| match e {
            HandlerError::Invalid(msg) => {
                debug!("🔌️ Rejected '{tag}' command: {msg}");
                Envelope::error(msg)
            },
            HandlerError::Provider(e) => {
                warn!("🔌️ '{tag}' command failed for user #{}. {e}", principal.id);
                Envelope::error(e)
            },
        });
        envelope.with_id(command.id)
    }

    fn ping() -> Envelope {
        Envelope::new(CommandTag::Ping.as_str(), json!({ "message": "pong" }))
    }

    async fn user(&self, principal: &Principal) -> HandlerResult {
        let key = principal.api_key.reveal();
        let payments = self.provider.payments(key).await?;
        let balance = self.provider.balance(key).await?;
        let mut details = principal.account_details();
        if let Some(obj) = details.as_object_mut() {
            obj.insert("payments".into(), payments);
            obj.insert("balance".into(), json!(balance));
        }
        Ok(Envelope::new(CommandTag::User.as_str(), details))
    }

    async fn create_invoice(&self, principal: &Principal, data: &Value) -> HandlerResult {
        let amount = amount_field(data).ok_or(HandlerError::Invalid("invalid amount"))?;
        let memo = str_field(data, "description").unwrap_or_default();
        let invoice = self.provider.create_invoice(principal.api_key.reveal(), amount, memo).await?;
        info!("🔌️ User #{} created an invoice for {amount} sat", principal.id);
        Ok(Envelope::new(
            CommandTag::CreateInvoice.as_str(),
            json!({ "invoice": invoice.payment_request, "payment_hash": invoice.payment_hash }),
        ))
    }

    async fn pay(&self, principal: &Principal, data: &Value) -> HandlerResult {
        let bolt11 = str_field(data, "bolt11").ok_or(HandlerError::Invalid("no bolt11"))?;
        let payment_hash = self.provider.pay_invoice(principal.api_key.reveal(), bolt11).await?;
        info!("🔌️ User #{} paid invoice {payment_hash}", principal.id);
        Ok(Envelope::new(CommandTag::Pay.as_str(), json!({ "payment_hash": payment_hash })))
    }

    /// Decodes whatever the user scanned. A BOLT11 invoice is returned as is; an LNURL is resolved and returned with
    /// the `lnurl` type so the client can decide between a pay and a withdraw flow.
    async fn invoice(&self, data: &Value) -> HandlerResult {
        let bolt11 = str_field(data, "bolt11").ok_or(HandlerError::Invalid("no bolt11"))?;
        let decoded = self.provider.decode_invoice(bolt11).await?;
        if decoded.get("payment_hash").is_some() {
            return Ok(Envelope::new(CommandTag::Invoice.as_str(), decoded));
        }
        match decoded.get("domain").and_then(Value::as_str) {
            Some(domain) => {
                let lnurl = self.provider.decode_lnurl(domain).await?;
                Ok(Envelope::new("lnurl", lnurl))
            },
            None => Err(HandlerError::Invalid("unhandled")),
        }
    }

    async fn pay_lnurlp(&self, principal: &Principal, data: &Value) -> HandlerResult {
        let (callback, amount) = match (str_field(data, "callback"), amount_field(data)) {
            (Some(c), Some(a)) => (c, a),
            _ => return Err(HandlerError::Invalid("invalid amount or callback")),
        };
        let comment = str_field(data, "comment").unwrap_or_default();
        let invoice = self.provider.lnurl_pay_invoice(callback, amount, comment).await?;
        let payment_hash = self.provider.pay_invoice(principal.api_key.reveal(), &invoice.payment_request).await?;
        info!("🔌️ User #{} paid LNURL invoice {payment_hash}", principal.id);
        Ok(lnurl_success(payment_hash, invoice.success_message))
    }

    async fn pay_lnurlw(&self, principal: &Principal, data: &Value) -> HandlerResult {
        let (callback, amount, k1) = match (str_field(data, "callback"), amount_field(data), str_field(data, "k1")) {
            (Some(c), Some(a), Some(k)) => (c, a, k),
            _ => return Err(HandlerError::Invalid("invalid amount or callback or k1")),
        };
        let invoice = self.provider.create_invoice(principal.api_key.reveal(), amount, "withdraw").await?;
        self.provider.lnurl_withdraw(callback, k1, &invoice.payment_request).await?;
        info!("🔌️ User #{} withdrew {amount} sat via LNURL", principal.id);
        Ok(lnurl_success(invoice.payment_hash, "withdrawn".into()))
    }
}

fn lnurl_success(payment_hash: String, message: String) -> Envelope {
    Envelope::new("lnurl_success", json!({ "payment_hash": payment_hash, "message": message }))
}

fn fields(data: &Value) -> Option<&Map<String, Value>> {
    data.as_object()
}

/// A non-empty string field.
fn str_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    fields(data)?.get(key)?.as_str().filter(|s| !s.is_empty())
}

/// A strictly positive `amount`, given either as a number or as a numeric string.
fn amount_field(data: &Value) -> Option<u64> {
    let amount = match fields(data)?.get("amount")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    (amount > 0).then_some(amount)
}

#[cfg(test)]
mod test {
    use mockall::predicate::eq;
    use serde_json::json;

    use super::*;
    use crate::{
        test_utils::{mocks::MockProvider, sample_principal},
        traits::{LnurlInvoice, NewInvoice},
    };

    const KEY: &str = "c80bda73f47f4539ad2514d9b409c1da";

    async fn dispatch(provider: MockProvider, tag: &str, data: Value) -> Envelope {
        let dispatcher = CommandDispatcher::new(provider);
        dispatcher.dispatch(&sample_principal(), CommandEnvelope::new(tag, data)).await
    }

    fn new_invoice() -> NewInvoice {
        NewInvoice { payment_hash: "a1b2c3".into(), payment_request: "lnbc10n1pjexample".into() }
    }

    #[tokio::test]
    async fn ping() {
        let env = dispatch(MockProvider::new(), "ping", Value::Null).await;
        assert_eq!(env, Envelope::new("ping", json!({"message": "pong"})));
    }

    #[tokio::test]
    async fn unknown_tags_are_unhandled() {
        for (tag, data) in [("Ping", json!({})), ("refund", json!({"amount": 5})), ("", Value::Null)] {
            let env = dispatch(MockProvider::new(), tag, data).await;
            assert_eq!(env, Envelope::new("unhandled", json!({"message": "unhandled"})));
        }
    }

    #[tokio::test]
    async fn correlation_ids_are_echoed() {
        let dispatcher = CommandDispatcher::new(MockProvider::new());
        let cmd = CommandEnvelope::new("ping", Value::Null).with_id(42);
        let env = dispatcher.dispatch(&sample_principal(), cmd).await;
        assert_eq!(env.id, Some(json!(42)));
        let cmd = CommandEnvelope::new("create_invoice", json!({})).with_id("x");
        let env = dispatcher.dispatch(&sample_principal(), cmd).await;
        assert_eq!(env.id, Some(json!("x")));
        assert!(env.is_error());
    }

    #[tokio::test]
    async fn user() {
        let mut provider = MockProvider::new();
        provider.expect_payments().with(eq(KEY)).times(1).returning(|_| Ok(json!([{"amount": 1000}])));
        provider.expect_balance().with(eq(KEY)).times(1).returning(|_| Ok(2100));
        let env = dispatch(provider, "user", Value::Null).await;
        assert_eq!(env.kind, "user");
        assert_eq!(env.data["username"], "alice");
        assert_eq!(env.data["api_key"], KEY);
        assert_eq!(env.data["balance"], 2100);
        assert_eq!(env.data["payments"], json!([{"amount": 1000}]));
    }

    #[tokio::test]
    async fn create_invoice() {
        let mut provider = MockProvider::new();
        provider
            .expect_create_invoice()
            .with(eq(KEY), eq(250u64), eq("coffee"))
            .times(1)
            .returning(|_, _, _| Ok(new_invoice()));
        let env = dispatch(provider, "create_invoice", json!({"amount": 250, "description": "coffee"})).await;
        assert_eq!(
            env,
            Envelope::new("create_invoice", json!({"invoice": "lnbc10n1pjexample", "payment_hash": "a1b2c3"}))
        );
    }

    #[tokio::test]
    async fn create_invoice_accepts_numeric_strings() {
        let mut provider = MockProvider::new();
        provider.expect_create_invoice().with(eq(KEY), eq(21u64), eq("")).returning(|_, _, _| Ok(new_invoice()));
        let env = dispatch(provider, "create_invoice", json!({"amount": "21"})).await;
        assert_eq!(env.kind, "create_invoice");
    }

    #[tokio::test]
    async fn create_invoice_rejects_bad_amounts() {
        for data in [json!({}), json!({"amount": 0}), json!({"amount": -5}), json!({"amount": "lots"}), json!([1])] {
            let mut provider = MockProvider::new();
            provider.expect_create_invoice().times(0);
            let env = dispatch(provider, "create_invoice", data).await;
            assert_eq!(env.error_message(), Some("invalid amount"));
        }
    }

    #[tokio::test]
    async fn provider_errors_are_contained() {
        let mut provider = MockProvider::new();
        provider
            .expect_pay_invoice()
            .returning(|_, _| Err(ProviderError::Rejected("Insufficient balance.".into())));
        let env = dispatch(provider, "pay", json!({"bolt11": "lnbc1..."})).await;
        assert_eq!(env.kind, "error");
        assert_eq!(env.error_message(), Some("Insufficient balance."));
        assert_eq!(env.data, json!({"message": "Insufficient balance."}));
    }

    #[tokio::test]
    async fn pay() {
        let mut provider = MockProvider::new();
        provider.expect_pay_invoice().with(eq(KEY), eq("lnbc1...")).returning(|_, _| Ok("ff00".into()));
        let env = dispatch(provider, "pay", json!({"bolt11": "lnbc1..."})).await;
        assert_eq!(env, Envelope::new("pay", json!({"payment_hash": "ff00"})));

        let env = dispatch(MockProvider::new(), "pay", json!({})).await;
        assert_eq!(env.error_message(), Some("no bolt11"));
    }

    #[tokio::test]
    async fn invoice_decodes_bolt11() {
        let mut provider = MockProvider::new();
        provider
            .expect_decode_invoice()
            .with(eq("lnbc1..."))
            .returning(|_| Ok(json!({"payment_hash": "a1b2c3", "amount_msat": 1000})));
        let env = dispatch(provider, "invoice", json!({"bolt11": "lnbc1..."})).await;
        assert_eq!(env, Envelope::new("invoice", json!({"payment_hash": "a1b2c3", "amount_msat": 1000})));
    }

    #[tokio::test]
    async fn invoice_resolves_lnurl() {
        let mut provider = MockProvider::new();
        provider
            .expect_decode_invoice()
            .returning(|_| Ok(json!({"domain": "https://lnurl.example.com/withdraw/abc"})));
        provider
            .expect_decode_lnurl()
            .with(eq("https://lnurl.example.com/withdraw/abc"))
            .times(1)
            .returning(|_| Ok(json!({"tag": "withdrawRequest", "k1": "k1k1"})));
        let env = dispatch(provider, "invoice", json!({"bolt11": "LNURL1DP68..."})).await;
        assert_eq!(env, Envelope::new("lnurl", json!({"tag": "withdrawRequest", "k1": "k1k1"})));
    }

    #[tokio::test]
    async fn invoice_with_unknown_shape() {
        let mut provider = MockProvider::new();
        provider.expect_decode_invoice().returning(|_| Ok(json!({"something": "else"})));
        provider.expect_decode_lnurl().times(0);
        let env = dispatch(provider, "invoice", json!({"bolt11": "???"})).await;
        assert_eq!(env.error_message(), Some("unhandled"));
    }

    #[tokio::test]
    async fn pay_lnurlp() {
        let mut provider = MockProvider::new();
        provider
            .expect_lnurl_pay_invoice()
            .with(eq("https://lnurl.example.com/cb"), eq(10_000u64), eq("thanks"))
            .times(1)
            .returning(|_, _, _| {
                Ok(LnurlInvoice { payment_request: "lnbc100n1p".into(), success_message: "Thank you!".into() })
            });
        provider.expect_pay_invoice().with(eq(KEY), eq("lnbc100n1p")).times(1).returning(|_, _| Ok("beef".into()));
        let data = json!({"callback": "https://lnurl.example.com/cb", "amount": 10_000, "comment": "thanks"});
        let env = dispatch(provider, "pay_lnurlp", data).await;
        assert_eq!(env, Envelope::new("lnurl_success", json!({"payment_hash": "beef", "message": "Thank you!"})));
    }

    #[tokio::test]
    async fn pay_lnurlp_validation() {
        let mut provider = MockProvider::new();
        provider.expect_lnurl_pay_invoice().times(0);
        provider.expect_pay_invoice().times(0);
        let env = dispatch(provider, "pay_lnurlp", json!({"amount": 1000})).await;
        assert_eq!(env.error_message(), Some("invalid amount or callback"));
    }

    #[tokio::test]
    async fn pay_lnurlw() {
        let mut provider = MockProvider::new();
        provider
            .expect_create_invoice()
            .with(eq(KEY), eq(500u64), eq("withdraw"))
            .times(1)
            .returning(|_, _, _| Ok(new_invoice()));
        provider
            .expect_lnurl_withdraw()
            .with(eq("https://lnurl.example.com/w"), eq("k1k1"), eq("lnbc10n1pjexample"))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let data = json!({"callback": "https://lnurl.example.com/w", "amount": 500, "k1": "k1k1"});
        let env = dispatch(provider, "pay_lnurlw", data).await;
        assert_eq!(env, Envelope::new("lnurl_success", json!({"payment_hash": "a1b2c3", "message": "withdrawn"})));
    }

    #[tokio::test]
    async fn pay_lnurlw_without_k1_never_calls_the_provider() {
        let mut provider = MockProvider::new();
        provider.expect_create_invoice().times(0);
        provider.expect_lnurl_withdraw().times(0);
        let data = json!({"callback": "https://lnurl.example.com/w", "amount": 500});
        let env = dispatch(provider, "pay_lnurlw", data).await;
        let value: Value = serde_json::from_str(&env.to_json()).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "invalid amount or callback or k1");
    }

    #[tokio::test]
    async fn every_known_tag_replies_with_its_own_type_or_an_error() {
        let tags = ["ping", "user", "create_invoice", "pay", "invoice", "pay_lnurlp", "pay_lnurlw"];
        for tag in tags {
            let mut provider = MockProvider::new();
            provider.expect_payments().returning(|_| Err(ProviderError::Unavailable("offline".into())));
            let env = dispatch(provider, tag, json!({})).await;
            assert!(env.kind == tag || env.is_error(), "{tag} replied with {}", env.kind);
        }
    }
}
