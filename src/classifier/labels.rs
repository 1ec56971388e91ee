/// Species names in the order the classifier was trained on.
///
/// Position `i` names output `i` of the model. Nothing at runtime can tell
/// whether this order matches the artifact on disk, so it must be kept in
/// step with the training label order by hand.
pub const PLANT_CLASS_NAMES: &[&str] = &[
    "African Violet (Saintpaulia ionantha)",
    "Aloe Vera",
    "Anthurium (Anthurium andraeanum)",
    "Areca Palm (Dypsis lutescens)",
    "Asparagus Fern (Asparagus setaceus)",
    "Begonia (Begonia spp.)",
    "Bird of Paradise (Strelitzia reginae)",
    "Birds Nest Fern (Asplenium nidus)",
    "Boston Fern (Nephrolepis exaltata)",
    "Calathea",
    "Cast Iron Plant (Aspidistra elatior)",
    "Chinese Money Plant (Pilea peperomioides)",
    "Chinese evergreen (Aglaonema)",
    "Christmas Cactus (Schlumbergera bridgesii)",
    "Chrysanthemum",
    "Ctenanthe",
    "Daffodils (Narcissus spp.)",
    "Dracaena",
    "Dumb Cane (Dieffenbachia spp.)",
    "Elephant Ear (Alocasia spp.)",
    "English Ivy (Hedera helix)",
    "Hyacinth (Hyacinthus orientalis)",
    "Iron Cross begonia (Begonia masoniana)",
    "Jade plant (Crassula ovata)",
    "Kalanchoe",
    "Lilium (Hemerocallis)",
    "Lily of the valley (Convallaria majalis)",
    "Money Tree (Pachira aquatica)",
    "Monstera Deliciosa (Monstera deliciosa)",
    "Orchid",
    "Parlor Palm (Chamaedorea elegans)",
    "Peace lily",
    "Poinsettia (Euphorbia pulcherrima)",
    "Polka Dot Plant (Hypoestes phyllostachya)",
    "Ponytail Palm (Beaucarnea recurvata)",
    "Pothos (Ivy arum)",
    "Prayer Plant (Maranta leuconeura)",
    "Rattlesnake Plant (Calathea lancifolia)",
    "Rubber Plant (Ficus elastica)",
    "Sago Palm (Cycas revoluta)",
    "Schefflera",
    "Snake plant (Sanseviera)",
    "Tradescantia",
    "Tulip",
    "Venus Flytrap",
    "Yucca",
    "ZZ Plant (Zamioculcas)",
];
