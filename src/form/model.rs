//! Onboarding form record and its field vocabulary.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use super::state::WizardStep;

/// Marketing objectives offered on the strategy step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Objective {
    #[serde(alias = "Más ventas")]
    Sales,
    #[serde(alias = "Seguidores")]
    Followers,
    #[serde(alias = "Posicionamiento")]
    Positioning,
    #[serde(alias = "Imagen visual")]
    VisualImage,
    #[serde(alias = "Otro")]
    Other,
}

impl Objective {
    pub const ALL: [Objective; 5] = [
        Self::Sales,
        Self::Followers,
        Self::Positioning,
        Self::VisualImage,
        Self::Other,
    ];

    /// Checkbox label shown to the client.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sales => "Más ventas",
            Self::Followers => "Seguidores",
            Self::Positioning => "Posicionamiento",
            Self::VisualImage => "Imagen visual",
            Self::Other => "Otro",
        }
    }
}

impl std::fmt::Display for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Sales => "Sales",
            Self::Followers => "Followers",
            Self::Positioning => "Positioning",
            Self::VisualImage => "VisualImage",
            Self::Other => "Other",
        };
        write!(f, "{s}")
    }
}

/// Social platforms the agency can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    Instagram,
    Facebook,
    #[serde(rename = "LinkedIn", alias = "Linkedin")]
    LinkedIn,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Self::Instagram, Self::Facebook, Self::LinkedIn];

    /// The (identifier, secret) field pair collected for this platform.
    pub fn credential_fields(self) -> (FieldName, FieldName) {
        match self {
            Self::Instagram => (FieldName::InstagramUser, FieldName::InstagramPassword),
            Self::Facebook => (FieldName::FacebookEmail, FieldName::FacebookPassword),
            Self::LinkedIn => (FieldName::LinkedinEmail, FieldName::LinkedinPassword),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Instagram => "Instagram",
            Self::Facebook => "Facebook",
            Self::LinkedIn => "LinkedIn",
        };
        write!(f, "{s}")
    }
}

/// Every scalar field of [`FormRecord`] that `set_field` can overwrite.
///
/// The serialized names match the JSON keys of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    FullName,
    Role,
    Email,
    Phone,
    BrandName,
    Description,
    MissionVisionValues,
    Differentiator,
    Personality,
    Competitors,
    OtherObjective,
    IdealCustomer,
    CreativeAssetsLink,
    AdsBudget,
    SocialAccountsExist,
    InstagramUser,
    InstagramPassword,
    FacebookEmail,
    FacebookPassword,
    LinkedinEmail,
    LinkedinPassword,
    BusinessHours,
    Address,
    CustomerContact,
    ApprovalContact,
    Comments,
}

impl FieldName {
    pub const ALL: [FieldName; 26] = [
        Self::FullName,
        Self::Role,
        Self::Email,
        Self::Phone,
        Self::BrandName,
        Self::Description,
        Self::MissionVisionValues,
        Self::Differentiator,
        Self::Personality,
        Self::Competitors,
        Self::OtherObjective,
        Self::IdealCustomer,
        Self::CreativeAssetsLink,
        Self::AdsBudget,
        Self::SocialAccountsExist,
        Self::InstagramUser,
        Self::InstagramPassword,
        Self::FacebookEmail,
        Self::FacebookPassword,
        Self::LinkedinEmail,
        Self::LinkedinPassword,
        Self::BusinessHours,
        Self::Address,
        Self::CustomerContact,
        Self::ApprovalContact,
        Self::Comments,
    ];

    /// JSON key of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Role => "role",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::BrandName => "brandName",
            Self::Description => "description",
            Self::MissionVisionValues => "missionVisionValues",
            Self::Differentiator => "differentiator",
            Self::Personality => "personality",
            Self::Competitors => "competitors",
            Self::OtherObjective => "otherObjective",
            Self::IdealCustomer => "idealCustomer",
            Self::CreativeAssetsLink => "creativeAssetsLink",
            Self::AdsBudget => "adsBudget",
            Self::SocialAccountsExist => "socialAccountsExist",
            Self::InstagramUser => "instagramUser",
            Self::InstagramPassword => "instagramPassword",
            Self::FacebookEmail => "facebookEmail",
            Self::FacebookPassword => "facebookPassword",
            Self::LinkedinEmail => "linkedinEmail",
            Self::LinkedinPassword => "linkedinPassword",
            Self::BusinessHours => "businessHours",
            Self::Address => "address",
            Self::CustomerContact => "customerContact",
            Self::ApprovalContact => "approvalContact",
            Self::Comments => "comments",
        }
    }

    /// Look up a field by its JSON key.
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == key)
    }

    /// The wizard step that collects this field.
    pub fn step(self) -> WizardStep {
        use FieldName::*;
        match self {
            FullName | Role | Email | Phone => WizardStep::Contact,
            BrandName | Description | MissionVisionValues | Differentiator | Personality
            | Competitors => WizardStep::BrandIdentity,
            OtherObjective | IdealCustomer | CreativeAssetsLink | AdsBudget => {
                WizardStep::Strategy
            }
            SocialAccountsExist | InstagramUser | InstagramPassword | FacebookEmail
            | FacebookPassword | LinkedinEmail | LinkedinPassword | BusinessHours | Address
            | CustomerContact => WizardStep::DigitalEcosystem,
            ApprovalContact | Comments => WizardStep::Closeout,
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An item of one of the two set-valued fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleItem {
    Objective(Objective),
    Platform(Platform),
}

/// Everything collected across the wizard for one onboarding session.
///
/// JSON keys are camelCase; the Spanish keys posted by the original web form
/// are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormRecord {
    // Contact
    #[serde(alias = "nombreCompleto")]
    pub full_name: String,
    #[serde(alias = "cargo")]
    pub role: String,
    pub email: String,
    #[serde(alias = "telefono")]
    pub phone: String,

    // Brand identity
    #[serde(alias = "nombreMarca")]
    pub brand_name: String,
    #[serde(alias = "descripcion")]
    pub description: String,
    #[serde(alias = "misionVisionValores")]
    pub mission_vision_values: String,
    #[serde(alias = "elementoDiferenciador")]
    pub differentiator: String,
    #[serde(alias = "personalidad")]
    pub personality: String,
    #[serde(alias = "competidores")]
    pub competitors: String,

    // Strategy
    #[serde(alias = "objetivos")]
    pub objectives: BTreeSet<Objective>,
    #[serde(alias = "otroObjetivo")]
    pub other_objective: String,
    #[serde(alias = "clienteIdeal")]
    pub ideal_customer: String,
    #[serde(alias = "materialGrafico")]
    pub creative_assets_link: String,
    #[serde(alias = "presupuestoAds")]
    pub ads_budget: String,

    // Digital ecosystem
    #[serde(alias = "redesCreadas", deserialize_with = "deserialize_yes_no")]
    pub social_accounts_exist: Option<bool>,
    #[serde(alias = "socialMediaPlatforms")]
    pub platforms: BTreeSet<Platform>,
    pub instagram_user: String,
    pub instagram_password: String,
    pub facebook_email: String,
    pub facebook_password: String,
    pub linkedin_email: String,
    pub linkedin_password: String,
    #[serde(alias = "horarioAtencion")]
    pub business_hours: String,
    #[serde(alias = "direccion")]
    pub address: String,
    #[serde(alias = "whatsappClientes")]
    pub customer_contact: String,

    // Closeout
    #[serde(alias = "contactoAprobacion")]
    pub approval_contact: String,
    #[serde(alias = "comentarios")]
    pub comments: String,
}

impl FormRecord {
    /// An all-empty record, as the wizard starts with.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `field` overwritten by `value`.
    pub fn with_field(&self, field: FieldName, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.set_field(field, value);
        next
    }

    /// Overwrite a single field in place.
    ///
    /// `SocialAccountsExist` accepts yes/no words ("si", "no", "true", ...);
    /// anything else leaves the question unanswered.
    pub fn set_field(&mut self, field: FieldName, value: impl Into<String>) {
        let value = value.into();
        if field == FieldName::SocialAccountsExist {
            self.social_accounts_exist = parse_yes_no(&value);
            return;
        }
        if let Some(slot) = self.text_mut(field) {
            *slot = value;
        }
    }

    /// Current value of a field rendered as text (`""` when unset).
    pub fn value(&self, field: FieldName) -> &str {
        match field {
            FieldName::SocialAccountsExist => match self.social_accounts_exist {
                Some(true) => "si",
                Some(false) => "no",
                None => "",
            },
            FieldName::FullName => &self.full_name,
            FieldName::Role => &self.role,
            FieldName::Email => &self.email,
            FieldName::Phone => &self.phone,
            FieldName::BrandName => &self.brand_name,
            FieldName::Description => &self.description,
            FieldName::MissionVisionValues => &self.mission_vision_values,
            FieldName::Differentiator => &self.differentiator,
            FieldName::Personality => &self.personality,
            FieldName::Competitors => &self.competitors,
            FieldName::OtherObjective => &self.other_objective,
            FieldName::IdealCustomer => &self.ideal_customer,
            FieldName::CreativeAssetsLink => &self.creative_assets_link,
            FieldName::AdsBudget => &self.ads_budget,
            FieldName::InstagramUser => &self.instagram_user,
            FieldName::InstagramPassword => &self.instagram_password,
            FieldName::FacebookEmail => &self.facebook_email,
            FieldName::FacebookPassword => &self.facebook_password,
            FieldName::LinkedinEmail => &self.linkedin_email,
            FieldName::LinkedinPassword => &self.linkedin_password,
            FieldName::BusinessHours => &self.business_hours,
            FieldName::Address => &self.address,
            FieldName::CustomerContact => &self.customer_contact,
            FieldName::ApprovalContact => &self.approval_contact,
            FieldName::Comments => &self.comments,
        }
    }

    /// Whether a field holds something other than whitespace.
    pub fn is_filled(&self, field: FieldName) -> bool {
        !self.value(field).trim().is_empty()
    }

    /// Return a copy with `item` added if absent or removed if present.
    ///
    /// Removing [`Objective::Other`] also clears its elaboration so a stale
    /// description never reaches a submission.
    pub fn toggle(&self, item: ToggleItem) -> Self {
        let mut next = self.clone();
        match item {
            ToggleItem::Objective(objective) => {
                if !next.objectives.remove(&objective) {
                    next.objectives.insert(objective);
                } else if objective == Objective::Other {
                    next.other_objective.clear();
                }
            }
            ToggleItem::Platform(platform) => {
                if !next.platforms.remove(&platform) {
                    next.platforms.insert(platform);
                }
            }
        }
        next
    }

    pub fn has_objective(&self, objective: Objective) -> bool {
        self.objectives.contains(&objective)
    }

    pub fn has_platform(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }

    /// The (identifier, secret) pair entered for a platform.
    pub fn credentials(&self, platform: Platform) -> (&str, &str) {
        let (id, secret) = platform.credential_fields();
        (self.value(id), self.value(secret))
    }

    fn text_mut(&mut self, field: FieldName) -> Option<&mut String> {
        let slot = match field {
            FieldName::SocialAccountsExist => return None,
            FieldName::FullName => &mut self.full_name,
            FieldName::Role => &mut self.role,
            FieldName::Email => &mut self.email,
            FieldName::Phone => &mut self.phone,
            FieldName::BrandName => &mut self.brand_name,
            FieldName::Description => &mut self.description,
            FieldName::MissionVisionValues => &mut self.mission_vision_values,
            FieldName::Differentiator => &mut self.differentiator,
            FieldName::Personality => &mut self.personality,
            FieldName::Competitors => &mut self.competitors,
            FieldName::OtherObjective => &mut self.other_objective,
            FieldName::IdealCustomer => &mut self.ideal_customer,
            FieldName::CreativeAssetsLink => &mut self.creative_assets_link,
            FieldName::AdsBudget => &mut self.ads_budget,
            FieldName::InstagramUser => &mut self.instagram_user,
            FieldName::InstagramPassword => &mut self.instagram_password,
            FieldName::FacebookEmail => &mut self.facebook_email,
            FieldName::FacebookPassword => &mut self.facebook_password,
            FieldName::LinkedinEmail => &mut self.linkedin_email,
            FieldName::LinkedinPassword => &mut self.linkedin_password,
            FieldName::BusinessHours => &mut self.business_hours,
            FieldName::Address => &mut self.address,
            FieldName::CustomerContact => &mut self.customer_contact,
            FieldName::ApprovalContact => &mut self.approval_contact,
            FieldName::Comments => &mut self.comments,
        };
        Some(slot)
    }
}

/// Parse a yes/no answer. Unknown or empty input means "not answered".
pub fn parse_yes_no(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "si" | "sí" | "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

fn deserialize_yes_no<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Flag(flag)) => Some(flag),
        Some(Raw::Text(text)) => parse_yes_no(&text),
    })
}
