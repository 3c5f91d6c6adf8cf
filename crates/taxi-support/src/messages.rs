//! Fixed customer-facing replies

use taxi_core::Language;

/// Canned replies, parameterised by the support hotline
#[derive(Debug, Clone)]
pub struct CannedReplies {
    phone: String,
}

impl CannedReplies {
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
        }
    }

    /// The FAQ table could not be loaded or is empty
    pub fn no_knowledge_base(&self, language: Language) -> String {
        match language {
            Language::Arabic => format!(
                "عذرًا، لا يمكنني الوصول إلى قاعدة المعرفة حاليًا. يرجى الاتصال بفريق الدعم على {}.",
                self.phone
            ),
            Language::English => format!(
                "I'm sorry, but I cannot access the knowledge base right now. Please contact our support team at {}.",
                self.phone
            ),
        }
    }

    pub fn greeting(&self, language: Language) -> String {
        match language {
            Language::Arabic => "مرحباً بك! كيف يمكنني مساعدتك اليوم؟".to_string(),
            Language::English => "Hello! How can I help you today?".to_string(),
        }
    }

    /// Nothing in the FAQ is related to the question
    pub fn contact_support(&self, language: Language) -> String {
        match language {
            Language::Arabic => format!(
                "أعتذر، ليس لدي معلومات محددة حول ذلك. يرجى الاتصال بخدمة العملاء على {}.",
                self.phone
            ),
            Language::English => format!(
                "I'm sorry, I don't have specific information about that. Please contact our customer support at {} for assistance.",
                self.phone
            ),
        }
    }

    /// A weak match was found but nothing good enough to quote
    pub fn rephrase(&self, language: Language) -> String {
        match language {
            Language::Arabic => {
                "عذرًا، لم أجد إجابة مناسبة لسؤالك. هل يمكنك إعادة صياغته أو طرح سؤال آخر؟"
                    .to_string()
            }
            Language::English => "I'm sorry, I couldn't find a relevant answer to your question. Could you please rephrase or ask something else?".to_string(),
        }
    }

    /// Substituted when an answer comes out blank
    pub fn thanks_for_contacting(&self, language: Language) -> String {
        match language {
            Language::Arabic => "شكرًا لتواصلك معنا. كيف يمكنني مساعدتك اليوم؟".to_string(),
            Language::English => "Thank you for contacting us. How can I help you today?".to_string(),
        }
    }
}

impl Default for CannedReplies {
    fn default() -> Self {
        Self::new("920000000")
    }
}
