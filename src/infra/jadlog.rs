//! Thin asynchronous client for the Jadlog embarcador API.
//!
//! - One `frete/valor` request per service level (Jadlog "modalidade").
//! - Shipment creation and tracking for the post-payment fulfillment flow.
//! - Loosely typed carrier fields are normalized here; a missing price becomes
//!   [`PRICE_SENTINEL`] instead of an error.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, offset};
use time::PrimitiveDateTime;
use tracing::{debug, warn};

use super::carrier::{CarrierError, CarrierGateway, RateQuery};
use crate::config::CarrierSettings;
use crate::domain::{
    PostalCode, QuoteSource, ServiceLevel, ShipmentOrder, ShipmentReceipt, ShippingOption,
    TrackingEvent, TrackingInfo,
};
use crate::util::{round2, version::user_agent};

const CARRIER_NAME: &str = "Jadlog";
/// Price reported when the carrier omits or garbles `vltotal`.
pub const PRICE_SENTINEL: f64 = 0.0;
const DELIVERY_TO_DOOR: &str = "D";
const STANDARD_INSURANCE: &str = "N";
const PICKUP_AT_SHIPPER: &str = "K";
const PARCEL_CONTENTS: &str = "Bicicletas, peças e acessórios";

/// Jadlog modality code and product name for a service level.
pub fn modality(level: ServiceLevel) -> (u8, &'static str) {
    match level {
        ServiceLevel::Economy => (3, ".PACKAGE"),
        ServiceLevel::Standard => (9, ".COM"),
        ServiceLevel::Express => (0, "EXPRESSO"),
    }
}

#[derive(Clone)]
struct Credentials {
    token: String,
    cnpj: String,
    account: Option<String>,
    contract: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"***")
            .field("cnpj", &self.cnpj)
            .field("account", &self.account)
            .field("contract", &self.contract)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct JadlogClient {
    http: Client,
    base_url: Url,
    credentials: Option<Credentials>,
    origin: Option<PostalCode>,
}

impl JadlogClient {
    pub fn new(settings: &CarrierSettings) -> Result<Self, CarrierError> {
        let base_url = parse_base_url(&settings.base_url)?;
        let http = Client::builder()
            .user_agent(user_agent())
            .timeout(settings.timeout())
            .build()?;

        let credentials = match (non_empty(&settings.token), non_empty(&settings.cnpj)) {
            (Some(token), Some(cnpj)) => Some(Credentials {
                token,
                cnpj,
                account: non_empty(&settings.account),
                contract: non_empty(&settings.contract),
            }),
            _ => None,
        };
        let origin = settings
            .origin_postal_code
            .as_deref()
            .and_then(PostalCode::parse);

        if credentials.is_none() || origin.is_none() {
            debug!(
                has_credentials = credentials.is_some(),
                has_origin = origin.is_some(),
                "jadlog client is not configured; quotes will be simulated"
            );
        }

        Ok(Self {
            http,
            base_url,
            credentials,
            origin,
        })
    }

    #[cfg(test)]
    fn with_timeout(mut self, timeout: std::time::Duration) -> Result<Self, CarrierError> {
        self.http = Client::builder()
            .user_agent(user_agent())
            .timeout(timeout)
            .build()?;
        Ok(self)
    }

    fn credentials(&self) -> Result<&Credentials, CarrierError> {
        match (&self.credentials, &self.origin) {
            (Some(credentials), Some(_)) => Ok(credentials),
            _ => Err(CarrierError::NotConfigured),
        }
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, CarrierError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let credentials = self.credentials()?;
        let url = self.url(path)?;
        debug!(%url, "jadlog request");

        let response = self
            .http
            .post(url)
            .bearer_auth(&credentials.token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CarrierError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let raw: Value = serde_json::from_str(&text)
            .map_err(|err| CarrierError::MalformedResponse(err.to_string()))?;
        if let Some(error) = raw.get("error").filter(|error| !error.is_null()) {
            return Err(CarrierError::Api(describe_error(error)));
        }
        serde_json::from_value(raw)
            .map_err(|err| CarrierError::MalformedResponse(err.to_string()))
    }

    fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

#[async_trait]
impl CarrierGateway for JadlogClient {
    fn name(&self) -> &str {
        CARRIER_NAME
    }

    fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    fn origin_postal_code(&self) -> Option<&PostalCode> {
        self.origin.as_ref()
    }

    async fn fetch_rate(&self, query: &RateQuery) -> Result<ShippingOption, CarrierError> {
        let credentials = self.credentials()?;
        let (code, product) = modality(query.service_level);
        let body = FreteRequest {
            frete: [FreteItem {
                cepori: query.origin.as_str(),
                cepdes: query.destination.as_str(),
                frap: None,
                peso: round2(query.billable_weight_kg),
                cnpj: &credentials.cnpj,
                conta: credentials.account.as_deref(),
                contrato: credentials.contract.as_deref(),
                modalidade: code,
                tpentrega: DELIVERY_TO_DOOR,
                tpseguro: STANDARD_INSURANCE,
                vldeclarado: round2(query.declared_value),
                vlcoleta: None,
            }],
        };

        let response: FreteResponse = self.post("frete/valor", &body).await?;
        let quote = response
            .frete
            .into_iter()
            .next()
            .ok_or_else(|| CarrierError::MalformedResponse("empty frete list".into()))?;

        if let Some(error) = quote.erro.as_ref().filter(|error| !error.is_null()) {
            return Err(CarrierError::Api(describe_error(error)));
        }

        let price = lenient_number(quote.vltotal.as_ref()).unwrap_or_else(|| {
            warn!(
                service_level = %query.service_level,
                raw = ?quote.vltotal,
                "jadlog returned no usable price; using sentinel"
            );
            PRICE_SENTINEL
        });
        let days = lenient_number(quote.prazo.as_ref())
            .filter(|days| *days >= 1.0)
            .map(|days| days.ceil() as u32);

        Ok(ShippingOption::new(
            CARRIER_NAME,
            query.service_level,
            product,
            price,
            delivery_estimate(days),
            QuoteSource::Live,
        ))
    }

    async fn create_shipment(
        &self,
        order: &ShipmentOrder,
    ) -> Result<ShipmentReceipt, CarrierError> {
        let credentials = self.credentials()?;
        let (code, _) = modality(order.service_level);
        let volumes = order.volumes.max(1);
        let per_volume = round2(order.weight_kg / f64::from(volumes));
        let recipient = &order.recipient;

        let body = PedidoRequest {
            conteudo: PARCEL_CONTENTS,
            pedido: vec![order.order_reference.as_str()],
            tot_peso: round2(order.weight_kg),
            tot_valor: round2(order.declared_value),
            modalidade: code,
            conta_corrente: credentials.account.as_deref(),
            nr_contrato: credentials.contract.as_deref(),
            tp_coleta: PICKUP_AT_SHIPPER,
            tipo_frete: 0,
            servico: 1,
            des: Destinatario {
                nome: &recipient.name,
                cnpj_cpf: &recipient.document,
                endereco: &recipient.street,
                numero: &recipient.number,
                compl: recipient.complement.as_deref(),
                bairro: &recipient.district,
                cidade: &recipient.city,
                uf: &recipient.state,
                cep: order.destination.as_str(),
                fone: recipient.phone.as_deref(),
                email: recipient.email.as_deref(),
            },
            volume: (1..=volumes)
                .map(|index| Volume {
                    peso: per_volume,
                    identificador: format!("{}-{index}", order.order_reference),
                })
                .collect(),
        };

        let response: PedidoResponse = self.post("pedido/incluir", &body).await?;
        if let Some(error) = response.erro.as_ref().filter(|error| !error.is_null()) {
            return Err(CarrierError::Api(describe_error(error)));
        }

        match (response.codigo, response.shipment_id) {
            (Some(code), Some(shipment_id)) => {
                debug!(%code, %shipment_id, status = ?response.status, "jadlog shipment created");
                Ok(ShipmentReceipt { code, shipment_id })
            }
            _ => Err(CarrierError::MalformedResponse(
                "shipment response missing codigo/shipmentId".into(),
            )),
        }
    }

    async fn track(&self, code: &str) -> Result<TrackingInfo, CarrierError> {
        let body = TrackingRequest {
            consulta: [TrackingQuery { codigo: code }],
        };
        let response: TrackingResponse = self.post("tracking/consultar", &body).await?;
        let entry = response
            .consulta
            .into_iter()
            .next()
            .ok_or_else(|| CarrierError::MalformedResponse("empty consulta list".into()))?;

        if let Some(error) = entry.error.as_ref().filter(|error| !error.is_null()) {
            return Err(CarrierError::Api(describe_error(error)));
        }

        let tracking = entry
            .tracking
            .ok_or_else(|| CarrierError::MalformedResponse("tracking block missing".into()))?;

        Ok(TrackingInfo {
            code: entry.codigo.unwrap_or_else(|| code.to_string()),
            status: tracking.status.unwrap_or_else(|| "DESCONHECIDO".to_string()),
            events: tracking
                .eventos
                .into_iter()
                .map(TrackingEvent::from)
                .collect(),
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    // `Url::join` drops the last path segment unless it ends with a slash.
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{raw}/"))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn delivery_estimate(days: Option<u32>) -> String {
    match days {
        Some(1) => "até 1 dia útil".to_string(),
        Some(days) => format!("até {days} dias úteis"),
        None => "prazo a confirmar".to_string(),
    }
}

/// Numbers, numeric strings and Brazilian-formatted strings (`"32,50"`, `"1.234,56"`);
/// anything else is `None`.
fn lenient_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => {
            let raw = raw.trim();
            let normalized = if raw.contains(',') {
                raw.replace('.', "").replace(',', ".")
            } else {
                raw.to_string()
            };
            normalized.parse::<f64>().ok()
        }
        _ => None,
    }?;
    (number.is_finite() && number >= 0.0).then_some(number)
}

fn describe_error(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => fields
            .get("descricao")
            .or_else(|| fields.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

/// `YYYY-MM-DD HH:MM:SS` in Brasília time, reported as RFC 3339. Unparseable input is kept verbatim.
fn normalize_timestamp(raw: &str) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(raw.trim(), &format)
        .ok()
        .and_then(|local| local.assume_offset(offset!(-3)).format(&Rfc3339).ok())
        .unwrap_or_else(|| raw.to_string())
}

#[derive(Debug, Serialize)]
struct FreteRequest<'a> {
    frete: [FreteItem<'a>; 1],
}

#[derive(Debug, Serialize)]
struct FreteItem<'a> {
    cepori: &'a str,
    cepdes: &'a str,
    frap: Option<&'a str>,
    peso: f64,
    cnpj: &'a str,
    conta: Option<&'a str>,
    contrato: Option<&'a str>,
    modalidade: u8,
    tpentrega: &'static str,
    tpseguro: &'static str,
    vldeclarado: f64,
    vlcoleta: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FreteResponse {
    #[serde(default)]
    frete: Vec<FreteDto>,
}

#[derive(Debug, Deserialize)]
struct FreteDto {
    #[serde(default)]
    vltotal: Option<Value>,
    #[serde(default)]
    prazo: Option<Value>,
    #[serde(default)]
    erro: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PedidoRequest<'a> {
    conteudo: &'static str,
    pedido: Vec<&'a str>,
    tot_peso: f64,
    tot_valor: f64,
    modalidade: u8,
    conta_corrente: Option<&'a str>,
    nr_contrato: Option<&'a str>,
    tp_coleta: &'static str,
    tipo_frete: u8,
    servico: u8,
    des: Destinatario<'a>,
    volume: Vec<Volume>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Destinatario<'a> {
    nome: &'a str,
    cnpj_cpf: &'a str,
    endereco: &'a str,
    numero: &'a str,
    compl: Option<&'a str>,
    bairro: &'a str,
    cidade: &'a str,
    uf: &'a str,
    cep: &'a str,
    fone: Option<&'a str>,
    email: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Volume {
    peso: f64,
    identificador: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PedidoResponse {
    #[serde(default)]
    codigo: Option<String>,
    #[serde(default)]
    shipment_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    erro: Option<Value>,
}

#[derive(Debug, Serialize)]
struct TrackingRequest<'a> {
    consulta: [TrackingQuery<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TrackingQuery<'a> {
    codigo: &'a str,
}

#[derive(Debug, Deserialize)]
struct TrackingResponse {
    #[serde(default)]
    consulta: Vec<TrackingEntryDto>,
}

#[derive(Debug, Deserialize)]
struct TrackingEntryDto {
    #[serde(default)]
    codigo: Option<String>,
    #[serde(default)]
    tracking: Option<TrackingDto>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TrackingDto {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    eventos: Vec<EventoDto>,
}

#[derive(Debug, Deserialize)]
struct EventoDto {
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    unidade: Option<String>,
}

impl From<EventoDto> for TrackingEvent {
    fn from(dto: EventoDto) -> Self {
        Self {
            occurred_at: dto
                .data
                .as_deref()
                .map(normalize_timestamp)
                .unwrap_or_default(),
            status: dto.status.unwrap_or_else(|| "DESCONHECIDO".to_string()),
            unit: dto.unidade,
        }
    }
}
