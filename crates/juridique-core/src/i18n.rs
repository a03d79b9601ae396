//! UI string lookup. French is the source language; Arabic is the only
//! other display language.

use crate::state::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    French,
    Arabic,
}

/// Every string the front-ends show outside the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiText {
    Title,
    Subtitle,
    InputPlaceholder,
    InputTitle,
    Sending,
    Thinking,
    SourcesTitle,
    FilterTitle,
    NoMatches,
    ExportDone,
    ExportFailed,
    NewConversation,
    LanguageLabel,
    ThemeLight,
    ThemeDark,
    LanguageAuto,
    LanguageFrench,
    LanguageTunisian,
    // Banners
    GenericServerError,
    NoResponse,
    ErrorPrefix,
    // Export role labels
    RoleUser,
    RoleAssistant,
    RoleSystem,
    // Chat pane headers
    HeaderUser,
    HeaderAssistant,
    HeaderSystem,
    // Footer hints
    HintEdit,
    HintSend,
    HintStopTyping,
    HintSearch,
    HintDone,
    HintClear,
    HintScroll,
    HintNew,
    HintExport,
    HintLanguage,
    HintTheme,
    HintQuit,
    HintWait,
}

pub fn tr(text: UiText, locale: Locale) -> &'static str {
    match locale {
        Locale::French => french(text),
        Locale::Arabic => arabic(text),
    }
}

fn french(text: UiText) -> &'static str {
    match text {
        UiText::Title => "Assistant Juridique Tunisien",
        UiText::Subtitle => "Posez vos questions sur le droit tunisien",
        UiText::InputPlaceholder => "Posez votre question juridique ici...",
        UiText::InputTitle => " Question ",
        UiText::Sending => "Envoi...",
        UiText::Thinking => "Rédaction de la réponse",
        UiText::SourcesTitle => " Sources juridiques ",
        UiText::FilterTitle => " Rechercher ",
        UiText::NoMatches => "Aucun message ne correspond à la recherche.",
        UiText::ExportDone => "Conversation exportée :",
        UiText::ExportFailed => "Échec de l'export :",
        UiText::NewConversation => "Nouvelle conversation",
        UiText::LanguageLabel => "Langue",
        UiText::ThemeLight => "clair",
        UiText::ThemeDark => "sombre",
        UiText::LanguageAuto => "Détection automatique",
        UiText::LanguageFrench => "Français",
        UiText::LanguageTunisian => "Tunisien",
        UiText::GenericServerError => "Une erreur s'est produite",
        UiText::NoResponse => {
            "Aucune réponse du serveur. Vérifiez que le serveur est en cours d'exécution."
        }
        UiText::ErrorPrefix => "Erreur",
        UiText::RoleUser => "Vous",
        UiText::RoleAssistant => "Assistant",
        UiText::RoleSystem => "Système",
        UiText::HeaderUser => "Vous",
        UiText::HeaderAssistant => "Assistant Juridique",
        UiText::HeaderSystem => "Système",
        UiText::HintEdit => " écrire ",
        UiText::HintSend => " envoyer ",
        UiText::HintStopTyping => " quitter la saisie ",
        UiText::HintSearch => " rechercher ",
        UiText::HintDone => " valider ",
        UiText::HintClear => " effacer ",
        UiText::HintScroll => " défiler ",
        UiText::HintNew => " nouvelle ",
        UiText::HintExport => " exporter ",
        UiText::HintLanguage => " langue ",
        UiText::HintTheme => " thème ",
        UiText::HintQuit => " quitter ",
        UiText::HintWait => " réponse en attente ",
    }
}

fn arabic(text: UiText) -> &'static str {
    match text {
        UiText::Title => "المساعد القانوني التونسي",
        UiText::Subtitle => "اطرح أسئلتك حول القانون التونسي",
        UiText::InputPlaceholder => "اكتب سؤالك القانوني هنا...",
        UiText::InputTitle => " سؤال ",
        UiText::Sending => "جارٍ الإرسال...",
        UiText::Thinking => "جارٍ تحرير الإجابة",
        UiText::SourcesTitle => " المصادر القانونية ",
        UiText::FilterTitle => " بحث ",
        UiText::NoMatches => "لا توجد رسائل مطابقة للبحث.",
        UiText::ExportDone => "تم تصدير المحادثة:",
        UiText::ExportFailed => "فشل التصدير:",
        UiText::NewConversation => "محادثة جديدة",
        UiText::LanguageLabel => "اللغة",
        UiText::ThemeLight => "فاتح",
        UiText::ThemeDark => "داكن",
        UiText::LanguageAuto => "كشف تلقائي",
        UiText::LanguageFrench => "الفرنسية",
        UiText::LanguageTunisian => "التونسية",
        UiText::GenericServerError => "حدث خطأ",
        UiText::NoResponse => "لا يوجد رد من الخادم. تحقق من أن الخادم قيد التشغيل.",
        UiText::ErrorPrefix => "خطأ",
        UiText::RoleUser => "أنت",
        UiText::RoleAssistant => "المساعد",
        UiText::RoleSystem => "النظام",
        UiText::HeaderUser => "أنت",
        UiText::HeaderAssistant => "المساعد القانوني",
        UiText::HeaderSystem => "النظام",
        UiText::HintEdit => " كتابة ",
        UiText::HintSend => " إرسال ",
        UiText::HintStopTyping => " إنهاء الكتابة ",
        UiText::HintSearch => " بحث ",
        UiText::HintDone => " تأكيد ",
        UiText::HintClear => " مسح ",
        UiText::HintScroll => " تمرير ",
        UiText::HintNew => " جديدة ",
        UiText::HintExport => " تصدير ",
        UiText::HintLanguage => " اللغة ",
        UiText::HintTheme => " المظهر ",
        UiText::HintQuit => " خروج ",
        UiText::HintWait => " في انتظار الرد ",
    }
}

/// Label used when writing a transcript out as text
pub fn role_label(role: Role, locale: Locale) -> &'static str {
    let key = match role {
        Role::User => UiText::RoleUser,
        Role::Assistant => UiText::RoleAssistant,
        Role::System => UiText::RoleSystem,
    };
    tr(key, locale)
}

/// Label shown above a message in the chat pane
pub fn role_header(role: Role, locale: Locale) -> &'static str {
    let key = match role {
        Role::User => UiText::HeaderUser,
        Role::Assistant => UiText::HeaderAssistant,
        Role::System => UiText::HeaderSystem,
    };
    tr(key, locale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_labels_french() {
        assert_eq!(role_label(Role::User, Locale::French), "Vous");
        assert_eq!(role_label(Role::Assistant, Locale::French), "Assistant");
        assert_eq!(role_label(Role::System, Locale::French), "Système");
    }

    #[test]
    fn test_arabic_differs_from_french() {
        assert_ne!(
            tr(UiText::NoResponse, Locale::Arabic),
            tr(UiText::NoResponse, Locale::French)
        );
    }
}
