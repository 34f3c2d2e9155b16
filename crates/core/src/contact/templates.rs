//! Localized call scripts and agent emails, rendered with tera.
//!
//! Requester and listing values go in through a [`Context`], so text such as
//! `{rent}` typed into a name is never expanded. Unknown languages fall back
//! to English.

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use crate::contact::ContactRequest;
use crate::domain::language::canonical_language;
use crate::domain::listing::Listing;

/// Twilio rejects message bodies above this many characters.
pub const SMS_MAX_CHARS: usize = 1600;

/// Registered as `.xml` so tera escapes the script.
const TWIML_TEMPLATE: &str =
    "<Response><Say>{{ script }}</Say><Pause length=\"2\"/><Say>Goodbye.</Say></Response>";

const CALL_SCRIPTS: &[(&str, &str)] = &[
    (
        "English",
        "Hello, this is Homefinder, a virtual housing assistant. \
         I am calling on behalf of {{ user_name }}, who is looking for affordable housing. \
         They are interested in the property at {{ address }} listed at ${{ rent }} per month. \
         Could you please share more information or schedule a viewing? \
         Their contact number is {{ user_phone }}. Thank you.",
    ),
    (
        "Spanish",
        "Hola, le habla Homefinder, un asistente virtual de vivienda. \
         Llamo en nombre de {{ user_name }}, quien busca vivienda asequible. \
         Le interesa la propiedad en {{ address }} con renta de ${{ rent }} al mes. \
         ¿Podría darnos más información o programar una visita? \
         Su número de contacto es {{ user_phone }}. Gracias.",
    ),
    (
        "French",
        "Bonjour, ici Homefinder, assistant virtuel pour le logement. \
         J'appelle au nom de {{ user_name }}, qui recherche un logement abordable. \
         Cette personne s'intéresse au bien situé {{ address }}, au loyer de ${{ rent }} par mois. \
         Pourriez-vous fournir plus d'informations ou organiser une visite ? \
         Son numéro est le {{ user_phone }}. Merci.",
    ),
    (
        "Amharic",
        "ሰላም፣ ይህ ሆምፋይንደር ነው፣ ምናባዊ የቤት ረዳት። \
         ተመጣጣኝ ቤት በሚፈልጉት በ{{ user_name }} ስም እደውላለሁ። \
         በ{{ address }} ያለውን በወር ${{ rent }} የሆነውን ቤት ይፈልጋሉ። \
         ተጨማሪ መረጃ መስጠት ወይም ጉብኝት ማዘጋጀት ይችላሉ? \
         ስልክ ቁጥራቸው {{ user_phone }} ነው። እናመሰግናለን።",
    ),
];

const EMAIL_SUBJECTS: &[(&str, &str)] = &[
    ("English", "Affordable housing inquiry: {{ address }}"),
    ("Spanish", "Consulta sobre vivienda asequible: {{ address }}"),
];

const EMAIL_BODIES: &[(&str, &str)] = &[
    (
        "English",
        "Dear {{ agent_name }},\n\n\
         My name is {{ user_name }} and I am looking for affordable housing. \
         I found your listing at {{ address }}, {{ city }}, {{ state }} for ${{ rent }}/month \
         and I am very interested.\n\n\
         Could you please contact me at {{ user_phone }}\
         {% if user_email %} / {{ user_email }}{% endif %} to discuss \
         availability and schedule a viewing?\n\n\
         Thank you for your time.\n\n\
         Best regards,\n{{ user_name }}",
    ),
    (
        "Spanish",
        "Estimado/a {{ agent_name }}:\n\n\
         Me llamo {{ user_name }} y estoy buscando vivienda asequible. \
         Encontré su propiedad en {{ address }}, {{ city }}, {{ state }} por ${{ rent }}/mes \
         y me interesa mucho.\n\n\
         ¿Podría contactarme al {{ user_phone }}\
         {% if user_email %} / {{ user_email }}{% endif %} para hablar de la \
         disponibilidad y coordinar una visita?\n\n\
         Gracias por su tiempo.\n\n\
         Atentamente,\n{{ user_name }}",
    ),
];

#[derive(Debug, Error)]
#[error("contact template `{name}` failed to render: {source}")]
pub struct TemplateError {
    name: &'static str,
    #[source]
    source: tera::Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

#[derive(Serialize)]
struct TemplateValues<'a> {
    user_name: &'a str,
    user_phone: &'a str,
    user_email: Option<&'a str>,
    agent_name: &'a str,
    address: &'a str,
    city: &'a str,
    state: &'a str,
    rent: u32,
}

impl<'a> TemplateValues<'a> {
    fn new(listing: &'a Listing, request: &'a ContactRequest) -> Self {
        Self {
            user_name: request.requester_name.trim(),
            user_phone: request.requester_phone.trim(),
            user_email: request
                .requester_email
                .as_deref()
                .map(str::trim)
                .filter(|email| !email.is_empty()),
            agent_name: non_empty_or(&listing.agent_name, "Agent"),
            address: non_empty_or(&listing.address, "the listed property"),
            city: &listing.city,
            state: &listing.state,
            rent: listing.monthly_rent,
        }
    }
}

pub fn call_script(listing: &Listing, request: &ContactRequest) -> Result<String, TemplateError> {
    let template = localized(CALL_SCRIPTS, &request.preferred_language);
    render("call_script.txt", template, listing, request)
}

/// The call script cut to [`SMS_MAX_CHARS`] characters.
pub fn sms_body(listing: &Listing, request: &ContactRequest) -> Result<String, TemplateError> {
    Ok(call_script(listing, request)?.chars().take(SMS_MAX_CHARS).collect())
}

pub fn email_message(
    listing: &Listing,
    request: &ContactRequest,
) -> Result<EmailMessage, TemplateError> {
    let language = &request.preferred_language;
    let subject = localized(EMAIL_SUBJECTS, language);
    let body = localized(EMAIL_BODIES, language);
    Ok(EmailMessage {
        subject: render("email_subject.txt", subject, listing, request)?,
        body: render("email_body.txt", body, listing, request)?,
    })
}

/// TwiML document that reads `script` aloud, pauses, then says goodbye.
pub fn twiml(script: &str) -> Result<String, TemplateError> {
    let mut context = Context::new();
    context.insert("script", script);
    render_with("twiml.xml", TWIML_TEMPLATE, &context)
}

fn localized(table: &'static [(&'static str, &'static str)], language: &str) -> &'static str {
    let canonical = canonical_language(language).unwrap_or(language.trim());
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(canonical))
        .or_else(|| table.first())
        .map(|(_, template)| *template)
        .unwrap_or_default()
}

fn render(
    name: &'static str,
    template: &str,
    listing: &Listing,
    request: &ContactRequest,
) -> Result<String, TemplateError> {
    let context = Context::from_serialize(TemplateValues::new(listing, request))
        .map_err(|source| TemplateError { name, source })?;
    render_with(name, template, &context)
}

/// Tera turns on HTML/XML escaping from the template name's extension.
fn render_with(
    name: &'static str,
    template: &str,
    context: &Context,
) -> Result<String, TemplateError> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, template).map_err(|source| TemplateError { name, source })?;
    tera.render(name, context).map_err(|source| TemplateError { name, source })
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
